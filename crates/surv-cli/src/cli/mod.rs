/*
[INPUT]:  Parsed CLI arguments
[OUTPUT]: Subcommand implementations
[POS]:    CLI layer - binary-only modules
[UPDATE]: When adding subcommands
*/

pub mod commands;
pub mod init;
