use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    //RTP errors
    #[error("RTP header size insufficient")]
    ErrHeaderSizeInsufficient,
    #[error("RTP header size insufficient for extension")]
    ErrHeaderSizeInsufficientForExtension,
    #[error("invalid RTP version")]
    ErrBadRtpVersion,
    #[error("buffer too small")]
    ErrBufferTooSmall,
    #[error("packet is not large enough")]
    ErrShortPacket,
    #[error("extension_payload must be in 32-bit words")]
    HeaderExtensionPayloadNot32BitWords,
    #[error("padding size exceeds payload size")]
    ErrBadPaddingSize,
    #[error("too many CSRC entries")]
    ErrTooManyCsrc,
    #[error("payload does not fit within the maximum payload size")]
    ErrPayloadTooBig,

    //RTCP errors
    /// Wrong marshal size.
    #[error("Wrong marshal size")]
    WrongMarshalSize,
    /// Packet lost exceeds maximum amount of packets
    /// that can possibly be lost.
    #[error("Invalid total lost count")]
    InvalidTotalLost,
    /// Packet contains an invalid header.
    #[error("Invalid header")]
    InvalidHeader,
    /// Too many reports.
    #[error("Too many reports")]
    TooManyReports,
    /// Packet received is too short.
    #[error("Packet too short to be read")]
    PacketTooShort,
    /// Wrong packet type.
    #[error("Wrong packet type")]
    WrongType,
    /// Invalid packet version.
    #[error("Invalid packet version")]
    BadVersion,
    /// Invalid padding value.
    #[error("Invalid padding value")]
    WrongPadding,

    //payload format state machines: waiting states
    /// More packets are needed before a unit can be emitted. Benign,
    /// keep feeding packets.
    #[error("need more packets")]
    ErrNeedMorePackets,
    /// A non-starting fragment was received with no starting fragment
    /// before it. Benign at stream start, keep feeding packets.
    #[error("received a non-starting fragment without any previous starting fragment")]
    ErrNonStartingFragment,

    //payload format state machines: fatal
    #[error("payload is too small")]
    ErrPayloadTooSmall,
    #[error("NALU size ({0}) is larger than maximum allowed ({1})")]
    ErrNaluTooBig(usize, usize),
    #[error("access unit size ({0}) is larger than maximum allowed ({1})")]
    ErrAccessUnitTooBig(usize, usize),
    #[error("frame size ({0}) is larger than maximum allowed ({1})")]
    ErrFrameTooBig(usize, usize),
    #[error("an RTP packet is missing, unable to reconstruct the unit")]
    ErrRtpPacketMissing,
    #[error("NALU type {0} is currently not handled")]
    NaluTypeIsNotHandled(u8),
    #[error("invalid NALU, empty contents")]
    ErrEmptyNalu,
    #[error("aggregation unit declared size ({0}) is larger than buffer ({1})")]
    AggregationSizeLargerThanBuffer(usize, usize),
    #[error("aggregation unit is empty")]
    ErrEmptyAggregation,
    #[error("fragment received with both start and end bit set")]
    ErrInvalidFragmentBits,
    #[error("received a non-starting fragment")]
    ErrUnexpectedFragment,
    #[error("too many P-Diff entries")]
    ErrTooManyPDiff,
    #[error("invalid fragment type {0}")]
    ErrInvalidFragmentType(u8),
    #[error("AU header length field is invalid")]
    ErrInvalidAuHeadersLength,
    #[error("AU index is not zero, interleaving is not supported")]
    ErrAuIndexNotZero,
    #[error("ADTS mode allows only one access unit per packet")]
    ErrAuCountMismatch,
    #[error("a fragmented packet must contain only one access unit")]
    ErrFragmentedMultipleAus,
    #[error("payload length info is truncated")]
    ErrTruncatedLengthInfo,
    #[error("MBZ field must be zero")]
    ErrMbzNotZero,
    #[error("fragment offset does not match buffered data")]
    ErrFragmentOffsetMismatch,
    #[error("payload length ({0}) is not a multiple of the transport stream packet size")]
    ErrNotMultipleOfTsPacket(usize),
    #[error("transport stream packet does not begin with a sync byte")]
    ErrMissingTsSyncByte,

    //unsupported payload features
    #[error("STAP-B packets are not supported")]
    ErrStapBUnsupported,
    #[error("MTAP packets are not supported")]
    ErrMtapUnsupported,
    #[error("FU-B packets are not supported")]
    ErrFuBUnsupported,
    #[error("PACI packets are not supported")]
    ErrPaciUnsupported,
    #[error("packetization mode 2 (interleaved) is not supported")]
    ErrInterleavedModeUnsupported,
    #[error("sprop-max-don-diff != 0 is not supported")]
    ErrDonlUnsupported,

    //codec bitstream errors
    #[error("not enough bits")]
    ErrNotEnoughBits,
    #[error("invalid exp-golomb code")]
    ErrInvalidGolomb,
    #[error("invalid ADTS syncword")]
    ErrAdtsInvalidSyncword,
    #[error("ADTS packets with CRC are not supported")]
    ErrAdtsCrcUnsupported,
    #[error("audio object type {0} is not supported")]
    ErrUnsupportedAudioType(u8),
    #[error("invalid sample rate index {0}")]
    ErrInvalidSampleRateIndex(u8),
    #[error("invalid sample rate {0}")]
    ErrInvalidSampleRate(u32),
    #[error("invalid channel configuration {0}")]
    ErrInvalidChannelConfig(u8),
    #[error("multiple frames per ADTS packet are not supported")]
    ErrAdtsMultipleFramesUnsupported,
    #[error("invalid ADTS frame length")]
    ErrAdtsInvalidFrameLength,
    #[error("invalid MPEG audio frame header")]
    ErrInvalidMpegAudioHeader,
    #[error("invalid AC-3 sync info")]
    ErrInvalidAc3SyncInfo,
    #[error("SPS is invalid")]
    ErrInvalidSps,
    #[error("Annex-B stream does not start with a NALU prefix")]
    ErrMissingNaluPrefix,
    #[error("DTS can not be extracted before an SPS is received")]
    ErrDtsSpsMissing,
    #[error("access unit does not contain a slice NALU")]
    ErrDtsSliceMissing,
    #[error("DTS is greater than PTS")]
    ErrDtsGreaterThanPts,
    #[error("pic_order_cnt_type 1 is not supported")]
    ErrPocType1Unsupported,

    //session errors
    #[error("received packet with an unexpected SSRC: expected {0}, got {1}")]
    ErrSsrcMismatch(u32, u32),
    #[error("clock rate must not be zero")]
    ErrZeroClockRate,
    #[error("reorder buffer capacity must be a power of two")]
    ErrBadReorderCapacity,

    //configuration errors
    #[error("invalid configuration: {0}")]
    ErrInvalidConfiguration(String),
    #[error("unsupported codec: {0}")]
    ErrUnsupportedCodec(String),
    #[error("missing format parameter: {0}")]
    ErrMissingFormatParameter(String),
    #[error("invalid format parameter {0}: {1}")]
    ErrInvalidFormatParameter(String, String),

    #[error("mutex poison: {0}")]
    PoisonError(String),
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Waiting states are not failures: the decoder consumed the packet but
    /// can not emit a unit yet. Callers continue with the next packet.
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            Error::ErrNeedMorePackets | Error::ErrNonStartingFragment
        )
    }
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::PoisonError(e.to_string())
    }
}
