// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! HTTP/2 SETTINGS parameters
//!
//! Settings are communicated as a sequence of (identifier, value) records.
//! Each record is optional; absent parameters keep their current value at
//! the receiver.

use crate::{connection_error, error::ConnectionError};
use s2n_codec::{DecoderBuffer, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.5.2
//# SETTINGS_HEADER_TABLE_SIZE (0x01):  This setting allows the sender to
//#    inform the remote endpoint of the maximum size of the compression
//#    table used to decode field blocks, in units of octets.

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.5.2
//# SETTINGS_ENABLE_PUSH (0x02):  This setting can be used to enable or
//#    disable server push.  A server MUST NOT send a PUSH_PROMISE frame
//#    if it receives this parameter set to a value of 0.

/// The identifier of a single settings parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SettingId(u16);

impl SettingId {
    pub const HEADER_TABLE_SIZE: Self = Self(0x1);
    pub const ENABLE_PUSH: Self = Self(0x2);
    pub const MAX_CONCURRENT_STREAMS: Self = Self(0x3);
    pub const INITIAL_WINDOW_SIZE: Self = Self(0x4);
    pub const MAX_FRAME_SIZE: Self = Self(0x5);
    pub const MAX_HEADER_LIST_SIZE: Self = Self(0x6);

    /// Creates a `SettingId` from the wire representation
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the wire representation of the identifier
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

/// Default for `SETTINGS_HEADER_TABLE_SIZE`
pub const DEFAULT_HEADER_TABLE_SIZE: u32 = 4096;

/// Default for `SETTINGS_ENABLE_PUSH`
pub const DEFAULT_ENABLE_PUSH: bool = true;

/// Default for `SETTINGS_INITIAL_WINDOW_SIZE`, which also bootstraps the
/// connection-level window
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65_535;

/// Default for `SETTINGS_MAX_FRAME_SIZE`
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 1 << 14;

/// The largest flow-control window either level may reach
pub const MAX_WINDOW_SIZE: u32 = (1 << 31) - 1;

/// The inclusive bounds for `SETTINGS_MAX_FRAME_SIZE`
pub const MAX_FRAME_SIZE_BOUNDS: (u32, u32) = (1 << 14, (1 << 24) - 1);

const SETTING_LEN: usize = 6;

/// A set of settings parameters carried by one SETTINGS frame.
///
/// Every parameter is optional; `None` means the parameter was not present
/// on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    header_table_size: Option<u32>,
    enable_push: Option<bool>,
    max_concurrent_streams: Option<u32>,
    initial_window_size: Option<u32>,
    max_frame_size: Option<u32>,
    max_header_list_size: Option<u32>,
}

impl Settings {
    pub const EMPTY: Self = Self {
        header_table_size: None,
        enable_push: None,
        max_concurrent_streams: None,
        initial_window_size: None,
        max_frame_size: None,
        max_header_list_size: None,
    };

    #[inline]
    pub fn header_table_size(&self) -> Option<u32> {
        self.header_table_size
    }

    #[inline]
    pub fn enable_push(&self) -> Option<bool> {
        self.enable_push
    }

    #[inline]
    pub fn max_concurrent_streams(&self) -> Option<u32> {
        self.max_concurrent_streams
    }

    #[inline]
    pub fn initial_window_size(&self) -> Option<u32> {
        self.initial_window_size
    }

    #[inline]
    pub fn max_frame_size(&self) -> Option<u32> {
        self.max_frame_size
    }

    #[inline]
    pub fn max_header_list_size(&self) -> Option<u32> {
        self.max_header_list_size
    }

    #[inline]
    pub fn with_header_table_size(mut self, value: u32) -> Self {
        self.header_table_size = Some(value);
        self
    }

    #[inline]
    pub fn with_enable_push(mut self, value: bool) -> Self {
        self.enable_push = Some(value);
        self
    }

    #[inline]
    pub fn with_max_concurrent_streams(mut self, value: u32) -> Self {
        self.max_concurrent_streams = Some(value);
        self
    }

    #[inline]
    pub fn with_initial_window_size(mut self, value: u32) -> Self {
        self.initial_window_size = Some(value);
        self
    }

    #[inline]
    pub fn with_max_frame_size(mut self, value: u32) -> Self {
        self.max_frame_size = Some(value);
        self
    }

    #[inline]
    pub fn with_max_header_list_size(mut self, value: u32) -> Self {
        self.max_header_list_size = Some(value);
        self
    }

    /// Returns true if no parameter is present
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Applies a single (identifier, value) record.
    ///
    /// Unknown identifiers are ignored; a repeated identifier keeps the
    /// most recently supplied value.
    pub fn set(&mut self, id: SettingId, value: u32) -> Result<(), ConnectionError> {
        match id {
            SettingId::HEADER_TABLE_SIZE => self.header_table_size = Some(value),
            SettingId::ENABLE_PUSH => {
                //= https://www.rfc-editor.org/rfc/rfc9113#section-6.5.2
                //# Any value other than 0 or 1 MUST be treated as a
                //# connection error (Section 5.4.1) of type PROTOCOL_ERROR.
                match value {
                    0 => self.enable_push = Some(false),
                    1 => self.enable_push = Some(true),
                    _ => {
                        return Err(connection_error!(
                            PROTOCOL_ERROR,
                            "SETTINGS_ENABLE_PUSH must be 0 or 1"
                        ))
                    }
                }
            }
            SettingId::MAX_CONCURRENT_STREAMS => self.max_concurrent_streams = Some(value),
            SettingId::INITIAL_WINDOW_SIZE => {
                //= https://www.rfc-editor.org/rfc/rfc9113#section-6.5.2
                //# Values above the maximum flow-control window size of
                //# 2^31-1 MUST be treated as a connection error
                //# (Section 5.4.1) of type FLOW_CONTROL_ERROR.
                if value > MAX_WINDOW_SIZE {
                    return Err(connection_error!(
                        FLOW_CONTROL_ERROR,
                        "SETTINGS_INITIAL_WINDOW_SIZE exceeds the maximum window size"
                    ));
                }
                self.initial_window_size = Some(value);
            }
            SettingId::MAX_FRAME_SIZE => {
                //= https://www.rfc-editor.org/rfc/rfc9113#section-6.5.2
                //# The initial value is 2^14 (16,384) octets.  The value
                //# advertised by an endpoint MUST be between this initial
                //# value and the maximum allowed frame size (2^24-1 or
                //# 16,777,215 octets), inclusive.
                let (min, max) = MAX_FRAME_SIZE_BOUNDS;
                if value < min || value > max {
                    return Err(connection_error!(
                        PROTOCOL_ERROR,
                        "SETTINGS_MAX_FRAME_SIZE outside the permitted range"
                    ));
                }
                self.max_frame_size = Some(value);
            }
            SettingId::MAX_HEADER_LIST_SIZE => self.max_header_list_size = Some(value),
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.5.2
            //# An endpoint that receives a SETTINGS frame with any unknown or
            //# unsupported identifier MUST ignore that setting.
            _ => {}
        }

        Ok(())
    }

    /// Decodes a complete SETTINGS frame payload.
    ///
    /// The caller is responsible for verifying that the payload length is a
    /// multiple of six octets.
    pub fn decode(buffer: DecoderBuffer) -> Result<(Self, DecoderBuffer), ConnectionError> {
        let mut settings = Self::EMPTY;
        let mut buffer = buffer;

        while !buffer.is_empty() {
            let (id, remaining) = buffer.decode::<u16>()?;
            let (value, remaining) = remaining.decode::<u32>()?;
            settings.set(SettingId::new(id), value)?;
            buffer = remaining;
        }

        Ok((settings, buffer))
    }

    /// Iterates over the present parameters in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (SettingId, u32)> {
        let entries = [
            (SettingId::HEADER_TABLE_SIZE, self.header_table_size),
            (
                SettingId::ENABLE_PUSH,
                self.enable_push.map(|enabled| enabled as u32),
            ),
            (
                SettingId::MAX_CONCURRENT_STREAMS,
                self.max_concurrent_streams,
            ),
            (SettingId::INITIAL_WINDOW_SIZE, self.initial_window_size),
            (SettingId::MAX_FRAME_SIZE, self.max_frame_size),
            (SettingId::MAX_HEADER_LIST_SIZE, self.max_header_list_size),
        ];

        entries
            .into_iter()
            .filter_map(|(id, value)| value.map(|value| (id, value)))
    }

    /// Returns the payload length of the encoded parameter records
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.iter().count() * SETTING_LEN
    }
}

impl EncoderValue for Settings {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        for (id, value) in self.iter() {
            buffer.encode(&id.as_u16());
            buffer.encode(&value);
        }
    }
}
