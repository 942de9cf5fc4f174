pub mod fuzzy;
pub mod searcher;
pub mod sorter;
