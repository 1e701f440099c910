use crate::pkt::{Msg, Packet, PktError, MSG_LEN, PACKET_LEN};

#[test]
fn freshly_built_packet_is_never_corrupt() {
    for (seq, ack, text) in [
        (0, 0, ""),
        (1, 0, "hello"),
        (7, 3, "exactly twenty bytes"),
        (u32::MAX, u32::MAX, "wrap"),
    ] {
        let pkt = Packet::build(seq, ack, Msg::from(text));
        assert!(!pkt.is_corrupt(), "built packet must verify: {text:?}");
    }
}

#[test]
fn tampering_after_build_is_detected() {
    let mut pkt = Packet::build(5, 2, Msg::from("payload"));
    pkt.payload[0] ^= 0xff;
    assert!(pkt.is_corrupt(), "payload flip must be detected");

    let mut pkt = Packet::build(5, 2, Msg::from("payload"));
    pkt.seq_num ^= 0x8000_0000;
    assert!(pkt.is_corrupt(), "seq flip must be detected");

    let mut pkt = Packet::build(5, 2, Msg::from("payload"));
    pkt.ack_num = pkt.ack_num.wrapping_add(1);
    assert!(pkt.is_corrupt(), "ack change must be detected");
}

#[test]
fn checksum_is_bytewise_sum_of_zeroed_encoding() {
    let pkt = Packet::build(3, 1, Msg::from("abc"));
    let zeroed = Packet {
        checksum: 0,
        ..pkt.clone()
    };
    let expected = zeroed
        .encode()
        .iter()
        .fold(0u32, |s, &b| s.wrapping_add(b as u32));
    assert_eq!(pkt.checksum, expected);
}

#[test]
fn encode_decode_round_trip_preserves_fields() {
    let pkt = Packet::build(42, 7, Msg::from("round trip"));
    let bytes = pkt.encode();
    assert_eq!(bytes.len(), PACKET_LEN);
    let back = Packet::decode(&bytes).expect("decode canonical form");
    assert_eq!(back, pkt);
    assert!(!back.is_corrupt());
}

#[test]
fn decode_rejects_wrong_length() {
    assert_eq!(Packet::decode(&[0u8; 31]), Err(PktError::BadLength(31)));
    assert_eq!(Packet::decode(&[0u8; 33]), Err(PktError::BadLength(33)));
    assert_eq!(Packet::decode(&[]), Err(PktError::BadLength(0)));
}

#[test]
fn msg_zero_pads_short_input_and_truncates_long_input() {
    let short = Msg::from("ab");
    assert_eq!(&short.0[..2], b"ab");
    assert!(short.0[2..].iter().all(|&b| b == 0), "padding must be zero");

    let long = Msg::from("this input is longer than twenty bytes");
    assert_eq!(long.0.len(), MSG_LEN);
    assert_eq!(&long.0, b"this input is longer");
}

#[test]
fn ack_packet_has_zero_seq_and_empty_payload() {
    let ack = Packet::build_ack(9);
    assert_eq!(ack.seq_num, 0);
    assert_eq!(ack.ack_num, 9);
    assert_eq!(ack.payload, [0u8; MSG_LEN]);
    assert!(!ack.is_corrupt());
}
