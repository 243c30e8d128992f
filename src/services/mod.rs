pub mod data_stores;
pub mod sample_data;
