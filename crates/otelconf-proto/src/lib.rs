//! # otelconf-proto — Reflective Protobuf Decoding
//!
//! Second decode strategy for a canonical configuration document: merge it
//! into a protobuf message whose schema is only known at runtime.
//!
//! The bundled `opentelemetry/sdk/v1/sdk.proto` is compiled by the build
//! script with `protox` and embedded as a descriptor set, so no `protoc`
//! install is required. Callers with their own protos use
//! [`ProtoBridge::from_proto_files`] or [`ProtoBridge::from_descriptor_set`].

pub mod bridge;

pub use bridge::{ProtoBridge, CONFIGURATION_MESSAGE};
