// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Types and utilities around the HTTP/2 stream identifier

use crate::endpoint;
use core::fmt;
use s2n_codec::{decoder_value, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-5.1.1
//# Streams are identified by an unsigned 31-bit integer.  Streams
//# initiated by a client MUST use odd-numbered stream identifiers; those
//# initiated by the server MUST use even-numbered stream identifiers.

/// The ID of a stream.
///
/// A stream ID is a 31-bit integer (0 to 2^31-1) that is unique for all
/// streams on a connection. Stream 0 is the connection control stream.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[cfg_attr(any(feature = "generator", test), derive(bolero_generator::TypeGenerator))]
pub struct StreamId(#[cfg_attr(any(feature = "generator", test), generator(0..=StreamId::MAX))] u32);

impl StreamId {
    /// The largest value a stream identifier can carry on the wire
    pub const MAX: u32 = (1 << 31) - 1;

    /// The connection control stream
    pub const CONNECTION: StreamId = StreamId(0);

    /// Creates a Stream ID from its wire value.
    ///
    /// Returns `None` if the value does not fit into 31 bits.
    #[inline]
    pub const fn new(id: u32) -> Option<StreamId> {
        if id <= Self::MAX {
            Some(StreamId(id))
        } else {
            None
        }
    }

    /// Converts the stream id into its wire value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true for the connection control stream (stream 0)
    #[inline]
    pub const fn is_connection_control(self) -> bool {
        self.0 == 0
    }

    /// Returns the endpoint that initiates streams with this identifier.
    ///
    /// Returns `None` for the connection control stream, which neither
    /// endpoint initiates.
    #[inline]
    pub fn initiator(self) -> Option<endpoint::Type> {
        if self.is_connection_control() {
            None
        } else if self.0 & 0x1 == 0x1 {
            Some(endpoint::Type::Client)
        } else {
            Some(endpoint::Type::Server)
        }
    }

    /// Returns true if streams with this identifier are initiated by the
    /// given endpoint
    #[inline]
    pub fn is_initiated_by(self, initiator: endpoint::Type) -> bool {
        self.initiator() == Some(initiator)
    }

    /// Returns the next `StreamId` initiated by the same endpoint.
    ///
    /// Returns `None` if the next Stream ID would not be valid, due to
    /// being out of bounds.
    #[inline]
    pub fn next_of_initiator(self) -> Option<StreamId> {
        // Stream IDs of one initiator increase in steps of 2, since the
        // least significant bit identifies the initiator
        self.0.checked_add(2).and_then(StreamId::new)
    }
}

impl From<StreamId> for u32 {
    #[inline]
    fn from(id: StreamId) -> Self {
        id.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-4.1
//# Stream Identifier:  A stream identifier (see Section 5.1.1) expressed
//#    as an unsigned 31-bit integer.  The value 0x00 is reserved for
//#    frames that are associated with the connection as a whole as
//#    opposed to an individual stream.

decoder_value!(
    impl<'a> StreamId {
        fn decode(buffer: Buffer) -> Result<Self> {
            // the high bit is reserved and ignored on receipt
            let (id, buffer) = buffer.decode::<u32>()?;
            Ok((StreamId(id & StreamId::MAX), buffer))
        }
    }
);

impl EncoderValue for StreamId {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiator_parity() {
        assert_eq!(StreamId::CONNECTION.initiator(), None);
        assert_eq!(
            StreamId::new(1).unwrap().initiator(),
            Some(endpoint::Type::Client)
        );
        assert_eq!(
            StreamId::new(2).unwrap().initiator(),
            Some(endpoint::Type::Server)
        );
        assert!(StreamId::new(3)
            .unwrap()
            .is_initiated_by(endpoint::Type::Client));
        assert!(!StreamId::CONNECTION.is_initiated_by(endpoint::Type::Server));
    }

    #[test]
    fn bounds() {
        assert!(StreamId::new(StreamId::MAX).is_some());
        assert!(StreamId::new(StreamId::MAX + 1).is_none());
        assert_eq!(
            StreamId::new(StreamId::MAX).unwrap().next_of_initiator(),
            None
        );
        assert_eq!(
            StreamId::new(3).unwrap().next_of_initiator(),
            StreamId::new(5)
        );
    }

    #[test]
    fn reserved_bit_is_ignored_on_decode() {
        use s2n_codec::DecoderBuffer;

        let bytes = 0x8000_0005u32.to_be_bytes();
        let buffer = DecoderBuffer::new(&bytes);
        let (id, remaining) = buffer.decode::<StreamId>().unwrap();
        assert!(remaining.is_empty());
        assert_eq!(id, StreamId::new(5).unwrap());
    }
}
