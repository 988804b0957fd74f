//! Core value types for the nodesynth graph engine.
//!
//! This crate defines the leaf types shared by every other crate: stereo
//! samples and blocks, note events, parameters and the controller link
//! table. The engine, the persistence layer and the audio backends all
//! speak in these types.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod audio_block;
mod control;
mod note_event;
mod param;
mod sample;

pub use audio_block::{AudioBlock, BLOCK_SIZE, SAMPLE_RATE};
pub use control::{ControlEvent, ControlLinks, ParamAddress};
pub use note_event::{EventList, NoteEvent, MAX_EVENTS};
pub use param::{AnyParam, ParamValue, Parameter};
pub use sample::{Sample, SampleAsset, SampleKey};

/// Component identifier. Unique and monotonic within a session.
pub type ComponentId = u32;
