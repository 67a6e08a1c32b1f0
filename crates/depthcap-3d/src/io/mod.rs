/// PLY writer and reader module.
pub mod ply;
