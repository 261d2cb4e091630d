use super::*;
use crate::error::SvcError;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;

const F_NRI_TYPE: u8 = 0b1001_1111;
const R_I_PRID: u8 = 0b1011_1111;
const N_DID_QID: u8 = 0b1000_1111;
const TID_U_D_O_RR: u8 = 0b1110_1011;
const X_Y_T_A_P_C_S_E: u8 = 0b1010_1010;

const SEI_FNRI_TYPE: u8 = 0x06;
const SEI_PAYLOAD_TYPE: u8 = 0x05;

fn stream_layout_payload() -> Vec<u8> {
    let mut payload = STREAM_LAYOUT_UUID.to_vec();
    payload.extend_from_slice(&[
        0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // lpb
        0x01, // reserved / P
        0x10, // record length
        // layer 1
        0x01, 0x40, 0x00, 0xb4, 0x01, 0x40, 0x00, 0xb4, 0x00, 0x01, 0x28, 0xe1, 0x00, 0x02, 0x00,
        0x00,
        // layer 2
        0x01, 0x40, 0x00, 0xb4, 0x01, 0x40, 0x00, 0xb4, 0x00, 0x00, 0x4a, 0x37, 0x11, 0x06, 0x00,
        0x00,
    ]);
    payload
}

fn bitstream_info_payload() -> Vec<u8> {
    let mut payload = BITSTREAM_INFO_UUID.to_vec();
    payload.extend_from_slice(&[0x01, 0x04]);
    payload
}

/// Size prefix + 3-byte header + payload
fn sei_container(payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() + 3) as u16;
    let mut out = len.to_be_bytes().to_vec();
    out.extend_from_slice(&[SEI_FNRI_TYPE, SEI_PAYLOAD_TYPE, payload.len() as u8]);
    out.extend_from_slice(payload);
    out
}

fn sei_header(payload: Vec<u8>) -> SeiHeader {
    SeiHeader::new(
        SEI_FNRI_TYPE,
        SEI_PAYLOAD_TYPE,
        payload.len() as u8,
        Bytes::from(payload),
    )
}

/// PACSI header with T set (DONC = 0) followed by a stream layout and a bitstream info SEI
fn sample_pacsi() -> Vec<u8> {
    let mut unit = vec![0x7e, 0xc0, 0x80, 0x07, 0x22, 0x00, 0x00];
    unit.extend(sei_container(&stream_layout_payload()));
    unit.extend(sei_container(&bitstream_info_payload()));
    unit
}

fn assert_stream_layout(sl: &StreamLayoutInfo) {
    assert!(!sl.header.forbidden_bit);
    assert_eq!(sl.header.ref_idc, 0);
    assert_eq!(sl.header.unit_type, 6);
    assert_eq!(sl.header.payload_type, 5);
    assert_eq!(sl.header.payload_size, 0x3a);

    assert_eq!(sl.lpb, [3, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(sl.reserved, 0);
    assert!(sl.p);
    assert_eq!(sl.record_length, Some(16));
    assert_eq!(sl.layers.len(), 2);

    let ld1 = &sl.layers[0];
    assert_eq!(ld1.coded_width, 320);
    assert_eq!(ld1.coded_height, 180);
    assert_eq!(ld1.display_width, 320);
    assert_eq!(ld1.display_height, 180);
    assert_eq!(ld1.bitrate, 76001);
    assert_eq!(ld1.fps_index, 0);
    assert_eq!(ld1.layer_temporal, 0);
    assert_eq!(ld1.priority_id, 0);
    assert!(ld1.crop);
    assert_eq!(ld1.reserved, 0);
    assert_eq!(ld1.reserved2, 0);
    assert_eq!(ld1.frame_rate().unwrap(), 7.5);

    let ld2 = &sl.layers[1];
    assert_eq!(ld2.coded_width, 320);
    assert_eq!(ld2.coded_height, 180);
    assert_eq!(ld2.display_width, 320);
    assert_eq!(ld2.display_height, 180);
    assert_eq!(ld2.bitrate, 18999);
    assert_eq!(ld2.fps_index, 2);
    assert_eq!(ld2.layer_temporal, 1);
    assert_eq!(ld2.priority_id, 1);
    assert!(ld2.crop);
    assert_eq!(ld2.reserved, 0);
    assert_eq!(ld2.reserved2, 0);
    assert_eq!(ld2.frame_rate().unwrap(), 15.0);
}

#[test]
fn test_pacsi_header_alternate_bits() {
    let pa = PacsiRecord::from_header([F_NRI_TYPE, R_I_PRID, N_DID_QID, TID_U_D_O_RR, X_Y_T_A_P_C_S_E]);
    assert!(pa.forbidden_bit);
    assert_eq!(pa.ref_idc, 0b00);
    assert_eq!(pa.unit_type, 0b11111);

    assert!(pa.retransmission);
    assert!(!pa.idr_flag);
    assert_eq!(pa.priority_id, 0b111111);

    assert!(pa.no_inter_layer_pred);
    assert_eq!(pa.dependency_id, 0b000);
    assert_eq!(pa.quality_id, 0b1111);

    assert_eq!(pa.temporal_id, 0b111);
    assert!(!pa.use_ref_base_pic);
    assert!(pa.discardable);
    assert!(!pa.output);
    assert_eq!(pa.reserved_rr, 0b11);

    assert!(pa.extension);
    assert!(!pa.has_y_fields);
    assert!(pa.has_t_fields);
    assert!(!pa.adaptive);
    assert!(pa.highest_temporal_at_level);
    assert!(!pa.crop);
    assert!(pa.scan);
    assert!(!pa.error_propagation);
}

#[test]
fn test_pacsi_header_inverted_bits() {
    let pa = PacsiRecord::from_header([
        !F_NRI_TYPE,
        !R_I_PRID,
        !N_DID_QID,
        !TID_U_D_O_RR,
        !X_Y_T_A_P_C_S_E,
    ]);
    assert!(!pa.forbidden_bit);
    assert_eq!(pa.ref_idc, 0b11);
    assert_eq!(pa.unit_type, 0b00000);

    assert!(!pa.retransmission);
    assert!(pa.idr_flag);
    assert_eq!(pa.priority_id, 0b000000);

    assert!(!pa.no_inter_layer_pred);
    assert_eq!(pa.dependency_id, 0b111);
    assert_eq!(pa.quality_id, 0b0000);

    assert_eq!(pa.temporal_id, 0b000);
    assert!(pa.use_ref_base_pic);
    assert!(!pa.discardable);
    assert!(pa.output);
    assert_eq!(pa.reserved_rr, 0b00);

    assert!(!pa.extension);
    assert!(pa.has_y_fields);
    assert!(!pa.has_t_fields);
    assert!(pa.adaptive);
    assert!(!pa.highest_temporal_at_level);
    assert!(pa.crop);
    assert!(!pa.scan);
    assert!(pa.error_propagation);
}

#[quickcheck]
fn prop_pacsi_header_fields_match_masks(header: (u8, u8, u8, u8, u8)) -> bool {
    let (b0, b1, b2, b3, b4) = header;
    let pa = PacsiRecord::from_header([b0, b1, b2, b3, b4]);
    let field = |byte: u8, mask: u8| (byte & mask) >> mask.trailing_zeros();
    let bit = |byte: u8, mask: u8| byte & mask != 0;

    pa.forbidden_bit == bit(b0, 0x80)
        && pa.ref_idc == field(b0, 0x60)
        && pa.unit_type == field(b0, 0x1f)
        && pa.retransmission == bit(b1, 0x80)
        && pa.idr_flag == bit(b1, 0x40)
        && pa.priority_id == field(b1, 0x3f)
        && pa.no_inter_layer_pred == bit(b2, 0x80)
        && pa.dependency_id == field(b2, 0x70)
        && pa.quality_id == field(b2, 0x0f)
        && pa.temporal_id == field(b3, 0xe0)
        && pa.use_ref_base_pic == bit(b3, 0x10)
        && pa.discardable == bit(b3, 0x08)
        && pa.output == bit(b3, 0x04)
        && pa.reserved_rr == field(b3, 0x03)
        && pa.extension == bit(b4, 0x80)
        && pa.has_y_fields == bit(b4, 0x40)
        && pa.has_t_fields == bit(b4, 0x20)
        && pa.adaptive == bit(b4, 0x10)
        && pa.highest_temporal_at_level == bit(b4, 0x08)
        && pa.crop == bit(b4, 0x04)
        && pa.scan == bit(b4, 0x02)
        && pa.error_propagation == bit(b4, 0x01)
}

#[test]
fn test_generic_sei_keeps_raw_payload() {
    let payload = [0xaa, 0xbb, 0xcc, 0xdd, 0xaa, 0xbb, 0xcc, 0xdd];
    let mut container = vec![F_NRI_TYPE, 5, 8];
    container.extend_from_slice(&payload);

    let sei = SeiMessage::parse(&container).unwrap();
    match &sei {
        SeiMessage::Generic(header) => {
            assert!(header.forbidden_bit);
            assert_eq!(header.ref_idc, 0);
            assert_eq!(header.unit_type, 0b11111);
            assert_eq!(header.payload_type, 5);
            assert_eq!(header.payload_size, 8);
            assert_eq!(&header.payload[..], &payload[..]);
            assert!(header.uuid().is_none());
        }
        other => panic!("expected generic SEI, got {:?}", other),
    }
    assert!(sei.to_string().contains("0xaa 0xbb 0xcc 0xdd"));
}

#[test]
fn test_stream_layout() {
    let sl = StreamLayoutInfo::parse(sei_header(stream_layout_payload())).unwrap();
    assert_stream_layout(&sl);
}

#[test]
fn test_stream_layout_without_descriptions() {
    let mut payload = STREAM_LAYOUT_UUID.to_vec();
    payload.extend_from_slice(&[0x03, 0, 0, 0, 0, 0, 0, 0, 0xfe]);
    let sl = StreamLayoutInfo::parse(sei_header(payload)).unwrap();
    assert!(!sl.p);
    assert_eq!(sl.reserved, 0x7f);
    assert_eq!(sl.record_length, None);
    assert!(sl.layers.is_empty());
}

#[test]
fn test_stream_layout_longer_records() {
    // 18-byte records: the two trailing bytes of each record are skipped
    let mut payload = STREAM_LAYOUT_UUID.to_vec();
    payload.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0x01, 18]);
    for _ in 0..2 {
        payload.extend_from_slice(&[
            0x02, 0x80, 0x01, 0x68, 0x02, 0x80, 0x01, 0x68, 0x00, 0x0f, 0x42, 0x40, 0x20, 0x08,
            0x00, 0x00, 0xff, 0xff,
        ]);
    }
    let sl = StreamLayoutInfo::parse(sei_header(payload)).unwrap();
    assert_eq!(sl.layers.len(), 2);
    assert_eq!(sl.layers[1].coded_width, 640);
    assert_eq!(sl.layers[1].coded_height, 360);
    assert_eq!(sl.layers[1].bitrate, 1_000_000);
    assert_eq!(sl.layers[1].fps_index, 4);
    assert_eq!(sl.layers[1].frame_rate().unwrap(), 30.0);
    assert_eq!(sl.layers[1].priority_id, 2);
}

#[test]
fn test_stream_layout_truncated_prefix() {
    let mut payload = STREAM_LAYOUT_UUID.to_vec();
    payload.extend_from_slice(&[0x03, 0, 0, 0]);
    assert!(matches!(
        StreamLayoutInfo::parse(sei_header(payload)),
        Err(SvcError::TruncatedInput { .. })
    ));
}

#[test]
fn test_stream_layout_partial_record() {
    let mut payload = stream_layout_payload();
    payload.truncate(payload.len() - 4);
    assert!(matches!(
        StreamLayoutInfo::parse(sei_header(payload)),
        Err(SvcError::TruncatedInput { what: "layer description", .. })
    ));
}

#[test]
fn test_stream_layout_short_record_length() {
    let mut payload = STREAM_LAYOUT_UUID.to_vec();
    payload.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0x01, 8]);
    payload.extend_from_slice(&[0x01, 0x40, 0x00, 0xb4, 0x01, 0x40, 0x00, 0xb4]);
    assert!(matches!(
        StreamLayoutInfo::parse(sei_header(payload)),
        Err(SvcError::TruncatedInput { .. })
    ));
}

#[test]
fn test_stream_layout_zero_record_length() {
    let mut payload = STREAM_LAYOUT_UUID.to_vec();
    payload.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0, 0xaa]);
    assert!(matches!(
        StreamLayoutInfo::parse(sei_header(payload)),
        Err(SvcError::InvalidData(_))
    ));
}

#[test]
fn test_undefined_fps_index() {
    let record = [
        0x01, 0x40, 0x00, 0xb4, 0x01, 0x40, 0x00, 0xb4, 0x00, 0x01, 0x28, 0xe1, 0x38, 0x00, 0x00,
        0x00,
    ];
    let ld = LayerDescription::parse(&record).unwrap();
    assert_eq!(ld.fps_index, 7);
    assert!(matches!(ld.frame_rate(), Err(SvcError::UnsupportedFpsIndex(7))));
    assert!(ld.to_string().contains("FPS            : unknown"));
}

#[test]
fn test_bitstream_info() {
    let bi = BitStreamInfo::parse(sei_header(bitstream_info_payload())).unwrap();
    assert!(!bi.header.forbidden_bit);
    assert_eq!(bi.header.ref_idc, 0);
    assert_eq!(bi.header.unit_type, 6);
    assert_eq!(bi.header.payload_type, 5);
    assert_eq!(bi.header.payload_size, 0x12);
    assert_eq!(bi.ref_frame_count, 1);
    assert_eq!(bi.nal_unit_count, 4);
}

#[test]
fn test_bitstream_info_truncated() {
    let mut payload = BITSTREAM_INFO_UUID.to_vec();
    payload.push(0x01);
    assert!(matches!(
        BitStreamInfo::parse(sei_header(payload)),
        Err(SvcError::TruncatedInput { .. })
    ));
}

#[test]
fn test_parse_pacsi() {
    let pa = parse_pacsi(&sample_pacsi()).unwrap();

    assert!(!pa.forbidden_bit);
    assert_eq!(pa.ref_idc, 3);
    assert_eq!(pa.unit_type, 30);

    assert!(pa.retransmission);
    assert!(pa.idr_flag);
    assert_eq!(pa.priority_id, 0);

    assert!(pa.no_inter_layer_pred);
    assert_eq!(pa.dependency_id, 0);
    assert_eq!(pa.quality_id, 0);

    assert_eq!(pa.temporal_id, 0);
    assert!(!pa.use_ref_base_pic);
    assert!(!pa.discardable);
    assert!(pa.output);
    assert_eq!(pa.reserved_rr, 3);

    assert!(!pa.extension);
    assert!(!pa.has_y_fields);
    assert!(pa.has_t_fields);
    assert!(!pa.adaptive);
    assert!(!pa.highest_temporal_at_level);
    assert!(!pa.crop);
    assert!(pa.scan);
    assert!(!pa.error_propagation);

    assert_eq!(pa.y_fields, None);
    assert_eq!(pa.decoding_order_number, Some(0));

    assert_eq!(pa.sei.len(), 2);
    match &pa.sei[0] {
        SeiMessage::StreamLayout(sl) => assert_stream_layout(sl),
        other => panic!("expected stream layout, got {:?}", other),
    }
    match &pa.sei[1] {
        SeiMessage::BitStreamInfo(bi) => {
            assert_eq!(bi.ref_frame_count, 1);
            assert_eq!(bi.nal_unit_count, 4);
        }
        other => panic!("expected bitstream info, got {:?}", other),
    }
    assert_eq!(pa.stream_layouts().count(), 1);
    assert_eq!(pa.bitstream_infos().count(), 1);
}

#[test]
fn test_parse_pacsi_from_nal_unit() {
    let unit = NalUnit::new(Bytes::from(sample_pacsi())).unwrap();
    assert!(unit.is_pacsi());
    let pa = PacsiRecord::parse(&unit).unwrap();
    assert_eq!(pa.sei.len(), 2);
}

#[test]
fn test_parse_pacsi_y_fields() {
    let unit = [0x7e, 0x00, 0x00, 0x00, 0x60, 0x2a, 0x01, 0x02, 0x12, 0x34];
    let pa = parse_pacsi(&unit).unwrap();
    assert_eq!(
        pa.y_fields,
        Some(PacsiYFields {
            tl0_pic_idx: 0x2a,
            idr_pic_id: 0x0102,
        })
    );
    assert_eq!(pa.decoding_order_number, Some(0x1234));
    assert!(pa.sei.is_empty());
}

#[test]
fn test_parse_pacsi_header_only() {
    let pa = parse_pacsi(&[0x7e, 0x00, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(pa.y_fields, None);
    assert_eq!(pa.decoding_order_number, None);
    assert!(pa.sei.is_empty());
}

#[test]
fn test_parse_pacsi_truncated_optional_fields() {
    // Y set but only two of the three bytes present
    let result = parse_pacsi(&[0x7e, 0x00, 0x00, 0x00, 0x40, 0x01, 0x02]);
    assert!(matches!(result, Err(SvcError::TruncatedInput { .. })));

    assert!(parse_pacsi(&[0x7e, 0x00, 0x00]).is_err());
}

#[test]
fn test_parse_pacsi_oversized_sei() {
    let mut unit = vec![0x7e, 0x00, 0x00, 0x00, 0x00];
    unit.extend_from_slice(&[0x00, 0x20, 0x06, 0x05, 0x01, 0xaa]);
    assert!(matches!(
        parse_pacsi(&unit),
        Err(SvcError::TruncatedInput { what: "sei container", .. })
    ));

    // Dangling single byte where a size prefix should be
    let mut unit = vec![0x7e, 0x00, 0x00, 0x00, 0x00];
    unit.push(0x00);
    assert!(matches!(
        parse_pacsi(&unit),
        Err(SvcError::TruncatedInput { what: "sei size", .. })
    ));
}

#[test]
fn test_short_container_is_generic() {
    // 15 payload bytes: one short of a UUID, even though they match the start
    // of a known one
    let payload = &STREAM_LAYOUT_UUID[..15];
    let mut container = vec![SEI_FNRI_TYPE, SEI_PAYLOAD_TYPE, payload.len() as u8];
    container.extend_from_slice(payload);
    assert!(matches!(SeiMessage::parse(&container).unwrap(), SeiMessage::Generic(_)));
}

#[test]
fn test_exact_uuid_selects_decoder() {
    // Exactly 16 payload bytes is enough to match; the decoder then runs out
    let mut container = vec![SEI_FNRI_TYPE, SEI_PAYLOAD_TYPE, sei::UUID_LEN as u8];
    container.extend_from_slice(&BITSTREAM_INFO_UUID);
    assert!(matches!(
        SeiMessage::parse(&container),
        Err(SvcError::TruncatedInput {
            what: "ref frame count",
            needed: 1,
            available: 0,
        })
    ));
}

#[test]
fn test_unknown_uuid_is_generic() {
    let mut payload = vec![0x42; 16];
    payload.extend_from_slice(&[0x01, 0x04]);
    let mut unit = vec![0x7e, 0x00, 0x00, 0x00, 0x00];
    unit.extend(sei_container(&payload));
    let pa = parse_pacsi(&unit).unwrap();
    match &pa.sei[0] {
        SeiMessage::Generic(header) => assert_eq!(header.payload.len(), 18),
        other => panic!("expected generic SEI, got {:?}", other),
    }
}

#[test]
fn test_sei_order_preserved() {
    let generic = [0x11, 0x22];
    let mut unit = vec![0x7e, 0x00, 0x00, 0x00, 0x00];
    unit.extend(sei_container(&bitstream_info_payload()));
    unit.extend(sei_container(&generic));
    unit.extend(sei_container(&stream_layout_payload()));
    unit.extend(sei_container(&bitstream_info_payload()));

    let pa = parse_pacsi(&unit).unwrap();
    let kinds: Vec<&str> = pa
        .sei
        .iter()
        .map(|sei| match sei {
            SeiMessage::Generic(_) => "generic",
            SeiMessage::StreamLayout(_) => "layout",
            SeiMessage::BitStreamInfo(_) => "info",
        })
        .collect();
    assert_eq!(kinds, vec!["info", "generic", "layout", "info"]);
}

#[test]
fn test_pacsi_dump() {
    let pa = parse_pacsi(&sample_pacsi()).unwrap();
    let dump = pa.to_string();
    assert!(dump.contains("TYPE : 30"));
    assert!(dump.contains("DONC : 0"));
    assert!(!dump.contains("TL0PICIDX"));
    assert!(dump.contains("-- SEI STREAM LAYOUT --"));
    assert!(dump.contains("BITRATE        : 76001"));
    assert!(dump.contains("FPS            : 7.5"));
    assert!(dump.contains("-- SEI BITSTREAM INFO --"));
    assert!(dump.contains("NUM OF NAL UNITS : 4"));
}
