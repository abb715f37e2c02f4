pub mod bonus;
pub mod pairing;
pub mod quiz;
pub mod records;
