pub mod grouped;
pub mod per_item;

#[cfg(test)]
pub(crate) mod fakes;
