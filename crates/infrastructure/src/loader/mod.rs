//! Test case loaders

mod yaml_file;

pub use yaml_file::YamlFileLoader;
