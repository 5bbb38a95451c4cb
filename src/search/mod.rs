//! Search layer: the fang-enumeration kernel and the per-worker structures
//! it feeds — an AVL tree deduplicating products and a bucketed list holding
//! confirmed results until commit.

pub mod kernel;
pub mod results;
pub mod tree;

pub use kernel::{
    enumerate_fangs, enumerate_fangs_uncached, FangSink, PairCount, PairDump, VampireSink,
};
pub use results::ResultList;
pub use tree::ProductTree;
