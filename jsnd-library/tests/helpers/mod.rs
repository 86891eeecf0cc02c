//! Shared utilities for jsnd-library integration tests

#![allow(dead_code, unused_imports)]

pub mod audio_generator;
pub mod db_utils;

pub use audio_generator::{mp3_actual_seconds, mp3_bytes, wav_bytes};
pub use db_utils::{seed_sound, FlakyStore, TestEnv};
