mod common;
use common::*;

use bytes::BytesMut;
use smartgen_bridge::modbus::frame;
use smartgen_bridge::modbus::{find_frame, Expect, FrameDecoder};
use tokio_util::codec::Decoder;

#[test]
fn crc_reference_vector() {
    assert_eq!(frame::crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0a]), 0xcdc5);

    let request = frame::build_read_request(1, 0, 10);
    assert_eq!(&request[..], &[0x01, 0x03, 0x00, 0x00, 0x00, 0x0a, 0xc5, 0xcd]);
    assert!(frame::has_valid_crc(&request));
}

#[test]
fn crc_known_buffers() {
    assert_eq!(frame::crc16(&[]), 0xffff);
    assert_eq!(frame::crc16(&[0x00; 8]), 0x0b40);
    assert_eq!(frame::crc16(&[0xff; 8]), 0x8f01);
    assert_eq!(frame::crc16(b"123456789"), 0x4b37);
    assert_eq!(frame::crc16(&[0x11, 0x03, 0x00, 0x6b, 0x00, 0x03]), 0x8776);
}

#[test]
fn read_round_trip() {
    let cases: &[(u8, u16, u16)] = &[
        (1, 0, 1),
        (1, 0, 125),
        (3, 212, 30),
        (17, 4352, 2),
        (247, 65411, 125),
    ];

    for &(unit, start, count) in cases {
        let request = frame::build_read_request(unit, start, count);
        assert_eq!(request.len(), 8);
        assert_eq!(request[0], unit);
        assert_eq!(request[1], 0x03);
        assert_eq!(u16::from_be_bytes([request[2], request[3]]), start);
        assert_eq!(u16::from_be_bytes([request[4], request[5]]), count);
        assert!(frame::has_valid_crc(&request));

        let registers: Vec<u16> = (0..count)
            .map(|i| i.wrapping_mul(7919).wrapping_add(unit as u16))
            .collect();
        let reply = frame::build_read_response(unit, &registers);
        assert_eq!(reply.len(), frame::read_response_len(count));
        assert_eq!(
            frame::parse_read_response(&reply, unit, count).unwrap(),
            registers,
            "unit {} start {} count {}",
            unit,
            start,
            count
        );
        let found = find_frame(&reply, &Expect::registers(unit, count)).unwrap();
        assert_eq!((found.offset, found.len), (0, reply.len()));
    }
}

#[test]
fn write_requests() {
    let coil = frame::build_write_coil(3, 0x0010, true);
    assert_eq!(&coil[..6], &[0x03, 0x05, 0x00, 0x10, 0xff, 0x00]);
    assert!(frame::has_valid_crc(&coil));

    let register = frame::build_write_register(1, 4368, 500);
    assert_eq!(&register[..6], &[0x01, 0x06, 0x11, 0x10, 0x01, 0xf4]);
    assert!(frame::has_valid_crc(&register));
}

#[test]
fn read_response_parses() {
    let reply = frame::build_read_response(1, &[0x1234, 0xfffe, 0]);
    assert_eq!(reply.len(), frame::read_response_len(3));
    assert_eq!(
        frame::parse_read_response(&reply, 1, 3).unwrap(),
        vec![0x1234, 0xfffe, 0]
    );
}

#[test]
fn read_response_rejects_bad_frames() {
    let reply = frame::build_read_response(1, &[1, 2]);

    // unit
    assert!(matches!(
        frame::parse_read_response(&reply, 2, 2),
        Err(Error::Frame(_))
    ));
    // byte count
    assert!(matches!(
        frame::parse_read_response(&reply, 1, 3),
        Err(Error::Frame(_))
    ));
    // crc
    let mut corrupt = reply.to_vec();
    corrupt[4] ^= 0x01;
    assert!(matches!(
        frame::parse_read_response(&corrupt, 1, 2),
        Err(Error::Frame(_))
    ));
    // truncated
    assert!(matches!(
        frame::parse_read_response(&reply[..reply.len() - 1], 1, 2),
        Err(Error::Frame(_))
    ));
}

#[test]
fn exception_response() {
    let reply = frame::build_exception_response(1, 0x03, 0x02);
    assert_eq!(reply.len(), frame::EXCEPTION_FRAME_LEN);
    assert_eq!(
        frame::parse_read_response(&reply, 1, 10),
        Err(Error::Exception {
            function: 0x03,
            code: 0x02
        })
    );

    let err = frame::parse_read_response(&reply, 1, 10).unwrap_err();
    assert!(err.to_string().contains("illegal data address"));
}

#[test]
fn echo_validation() {
    let request = frame::build_write_register(1, 4352, 800);
    assert_eq!(frame::validate_echo(&request, &request), Ok(()));

    let other = frame::build_write_register(1, 4352, 801);
    assert!(matches!(
        frame::validate_echo(&request, &other),
        Err(Error::Frame(_))
    ));

    let exception = frame::build_exception_response(1, 0x06, 0x03);
    assert_eq!(
        frame::validate_echo(&request, &exception),
        Err(Error::Exception {
            function: 0x06,
            code: 0x03
        })
    );

    assert!(matches!(
        frame::validate_echo(&request, &request[..5]),
        Err(Error::Frame(_))
    ));
}

#[test]
fn scanner_skips_leading_garbage() {
    common_setup();

    let wanted = frame::build_read_response(1, &[10, 20, 30, 40]);

    // includes bytes equal to the unit address and the function code
    let garbage = [0x01u8, 0x03, 0x01, 0x00, 0xff, 0x01, 0x03, 0x08, 0x55];
    for n in 0..=garbage.len() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&garbage[..n]);
        buf.extend_from_slice(&wanted);

        let found = find_frame(&buf, &Expect::registers(1, 4)).unwrap();
        assert_eq!(found.offset, n, "garbage of {} bytes", n);
        assert_eq!(found.len, wanted.len());

        let mut decoder = FrameDecoder::new(Expect::registers(1, 4));
        assert_eq!(decoder.decode(&mut buf).unwrap(), Some(wanted.clone()));
        assert_eq!(decoder.discarded(), n);
        assert!(buf.is_empty());
    }
}

#[test]
fn scanner_ignores_other_units() {
    let foreign = frame::build_read_response(2, &[1, 2]);
    let wanted = frame::build_read_response(1, &[3, 4]);
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&foreign);
    buf.extend_from_slice(&wanted);

    let found = find_frame(&buf, &Expect::registers(1, 2)).unwrap();
    assert_eq!(found.offset, foreign.len());
}

#[test]
fn scanner_finds_exception_replies() {
    let reply = frame::build_exception_response(1, 0x03, 0x04);
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[0x00, 0x42]);
    buf.extend_from_slice(&reply);

    let mut decoder = FrameDecoder::new(Expect::registers(1, 10));
    let frame_bytes = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame_bytes, reply);
    assert_eq!(
        frame::parse_read_response(&frame_bytes, 1, 10),
        Err(Error::Exception {
            function: 0x03,
            code: 0x04
        })
    );
}

#[test]
fn scanner_matches_echo() {
    let request = frame::build_write_coil(1, 5, false);
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&frame::build_read_response(1, &[9]));
    buf.extend_from_slice(&request);

    let found = find_frame(&buf, &Expect::echo_of(&request)).unwrap();
    assert_eq!(found.len, frame::ECHO_FRAME_LEN);
    assert_eq!(&buf[found.offset..found.offset + found.len], &request[..]);
}

#[test]
fn scanner_gives_up_on_endless_garbage() {
    let mut buf = BytesMut::from(&vec![0xaau8; 5000][..]);
    let mut decoder = FrameDecoder::new(Expect::registers(1, 1));
    assert!(matches!(decoder.decode(&mut buf), Err(Error::Frame(_))));
}
