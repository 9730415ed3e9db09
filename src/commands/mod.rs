pub mod check;
pub mod collect;
pub mod init;
pub mod inline;
pub mod status;
