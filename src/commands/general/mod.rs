//! General purpose commands.

pub mod embed;
