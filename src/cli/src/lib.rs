//! Eru image CLI - build images on the Eru core.

pub mod commands;
