//! Player and tournament rosters loaded from line-oriented text files

pub mod alias;
pub mod tournaments;

pub use alias::AliasTable;
pub use tournaments::{load_tournament_list, parse_tournament_list};
