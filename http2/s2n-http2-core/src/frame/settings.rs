// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    connection_error,
    error::ConnectionError,
    frame::{FrameHeader, Tag},
    settings::Settings,
    stream::StreamId,
};
use s2n_codec::{DecoderBuffer, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.5
//# The SETTINGS frame (type=0x04) conveys configuration parameters that
//# affect how endpoints communicate, such as preferences and constraints
//# on peer behavior.

macro_rules! settings_tag {
    () => {
        0x04u8
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-6.5
//# ACK (0x01):  When set, the ACK flag indicates that this frame
//#    acknowledges receipt and application of the peer's SETTINGS frame.

/// Acknowledges receipt and application of the peer's SETTINGS frame
pub const ACK: u8 = 0x01;

/// A SETTINGS frame, either carrying parameters or acknowledging them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettingsFrame {
    /// If true, the frame acknowledges the peer's SETTINGS and carries no
    /// parameters
    pub ack: bool,

    /// The parameters carried by the frame
    pub settings: Settings,
}

impl SettingsFrame {
    /// Creates a SETTINGS frame carrying the given parameters
    #[inline]
    pub const fn new(settings: Settings) -> Self {
        Self {
            ack: false,
            settings,
        }
    }

    /// Creates a SETTINGS acknowledgement frame
    #[inline]
    pub const fn ack() -> Self {
        Self {
            ack: true,
            settings: Settings::EMPTY,
        }
    }

    pub const fn tag(&self) -> Tag {
        settings_tag!()
    }

    /// Decodes the payload for the given frame header
    pub fn decode(
        header: FrameHeader,
        buffer: DecoderBuffer,
    ) -> Result<(Self, DecoderBuffer), ConnectionError> {
        //= https://www.rfc-editor.org/rfc/rfc9113#section-6.5
        //# If an endpoint receives a SETTINGS frame whose Stream Identifier
        //# field is anything other than 0x00, the endpoint MUST respond with
        //# a connection error (Section 5.4.1) of type PROTOCOL_ERROR.
        if !header.stream_id.is_connection_control() {
            return Err(connection_error!(
                PROTOCOL_ERROR,
                "SETTINGS frame on a non-zero stream"
            ));
        }

        if header.flag(ACK) {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.5
            //# Receipt of a SETTINGS frame with the ACK flag set and a length
            //# field value other than 0 MUST be treated as a connection error
            //# (Section 5.4.1) of type FRAME_SIZE_ERROR.
            if !buffer.is_empty() {
                return Err(connection_error!(
                    FRAME_SIZE_ERROR,
                    "SETTINGS acknowledgement with a non-empty payload"
                ));
            }

            return Ok((Self::ack(), buffer));
        }

        let (settings, buffer) = Settings::decode(buffer)?;

        Ok((Self::new(settings), buffer))
    }
}

impl EncoderValue for SettingsFrame {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        let flags = if self.ack { ACK } else { 0 };
        let header = FrameHeader::new(
            self.settings.payload_len() as u32,
            self.tag(),
            flags,
            StreamId::CONNECTION,
        );
        buffer.encode(&header);
        buffer.encode(&self.settings);
    }
}
