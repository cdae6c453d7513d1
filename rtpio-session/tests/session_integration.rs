use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};

use bytes::Bytes;
use rtp::codec::Format;
use rtp::codec::h264::{H264Depacketizer, H264Packetizer};
use rtp::packetizer::Packetizer;
use rtpio_session::{Cleaner, RtcpReceiver, RtcpSender};
use shared::error::Result;

/// Full receive path: packetize an access unit, shuffle the packets,
/// clean, reorder and account them, then reassemble the access unit.
#[test]
fn test_receive_path_reorders_and_reassembles() -> Result<()> {
    let mut packetizer = H264Packetizer::new(96, Some(0x11223344), Some(1000), Some(0), None);
    let mut cleaner = Cleaner::new(true, None);
    let t0 = Instant::now();
    let mut receiver = RtcpReceiver::new(90000, Some(0x0DDF00D5), Duration::from_secs(1), t0)?;
    let mut depacketizer = H264Depacketizer::new();

    let mut big_slice = vec![0x65];
    big_slice.extend(vec![0x42; 5000]);
    let au = vec![
        Bytes::from_static(&[0x67, 0x42, 0x00, 0x1E]),
        Bytes::from_static(&[0x68, 0xCE, 0x38, 0x80]),
        Bytes::from(big_slice),
    ];

    let mut packets = packetizer.packetize(&au, 0)?;
    // swap two packets to simulate reordering on the wire
    packets.swap(1, 2);

    let mut decoded = Vec::new();
    for pkt in packets {
        for cleaned in cleaner.process(pkt)? {
            let (emitted, lost) = receiver.process_packet(cleaned, t0, true)?;
            assert_eq!(lost, 0);
            for in_order in emitted {
                match depacketizer.depacketize_until_marker(&in_order) {
                    Ok(nalus) => decoded = nalus,
                    Err(e) if e.is_waiting() => {}
                    Err(e) => return Err(e),
                }
            }
        }
    }

    assert_eq!(decoded, au);

    let report = receiver.handle_timeout(t0 + Duration::from_secs(1)).unwrap();
    assert_eq!(report.reports[0].ssrc, 0x11223344);
    assert_eq!(report.reports[0].total_lost, 0);

    Ok(())
}

/// Send side and receive side exchanging a sender report: the receiver
/// learns the wall-clock mapping and reflects LSR/DLSR in its report.
#[test]
fn test_clock_synchronization_round_trip() -> Result<()> {
    let wall0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let t0 = Instant::now();

    let mut sender = RtcpSender::new(90000, Some(0xAAAA0001), Duration::from_millis(500), wall0);
    let mut receiver = RtcpReceiver::new(90000, Some(0xBBBB0002), Duration::from_secs(1), t0)?;

    let format = Format::from_sdp(96, "90000", "H264", &HashMap::new())?;
    let mut packetizer = format.packetizer();
    let packets = packetizer.packetize(&[Bytes::from_static(&[0x65, 0x11, 0x22])], 0)?;

    for pkt in &packets {
        sender.process_packet(pkt, wall0, wall0, true);
    }

    let sr = sender
        .handle_timeout(wall0 + Duration::from_secs(1))
        .unwrap();
    assert_eq!(sr.packet_count, packets.len() as u32);

    for pkt in packets {
        let ts = pkt.header.timestamp;
        receiver.process_packet(pkt, t0, true)?;

        receiver.process_sender_report(&sr, t0);
        let mapped = receiver.packet_ntp(ts.wrapping_add(180_000)).unwrap();
        // the mapped time sits one second past the report's own RTP time
        let sr_wall = shared::time::ntp2unix(sr.ntp_time);
        let diff = mapped
            .duration_since(sr_wall)
            .unwrap_or_default()
            .as_secs_f64();
        assert!((diff - 1.0).abs() < 0.01, "diff {diff}");
    }

    let report = receiver.handle_timeout(t0 + Duration::from_secs(1)).unwrap();
    assert_ne!(report.reports[0].last_sender_report, 0);

    Ok(())
}
