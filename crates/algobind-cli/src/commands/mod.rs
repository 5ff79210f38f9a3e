pub mod bind;
pub mod call;
pub mod doc;
pub mod signatures;
