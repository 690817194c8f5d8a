pub mod marks;
pub mod pages;
pub mod search;
pub mod updates;
