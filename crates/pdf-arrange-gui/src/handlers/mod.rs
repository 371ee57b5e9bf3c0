pub mod assemble;
pub mod load;
