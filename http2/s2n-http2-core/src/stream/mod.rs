// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Types and utilities around HTTP/2 streams

pub mod id;
pub mod state;

pub use id::StreamId;
pub use state::State;
