//! Canned documents in the formats the acquisition pipeline consumes.

/// Run index documents (one JSON object per line).
pub mod index {
    /// Byte offset of the 10u message in [`sample_index`].
    pub const SAMPLE_U_OFFSET: u64 = 1_200;
    /// Byte length of the 10u message in [`sample_index`].
    pub const SAMPLE_U_LENGTH: u64 = 600;
    /// Byte offset of the 10v message in [`sample_index`].
    pub const SAMPLE_V_OFFSET: u64 = 1_800;
    /// Byte length of the 10v message in [`sample_index`].
    pub const SAMPLE_V_LENGTH: u64 = 640;

    /// One index line.
    pub fn index_line(param: &str, levtype: &str, offset: u64, length: u64) -> String {
        format!(
            r#"{{"domain": "g", "date": "20240101", "time": "0000", "expver": "0001", "class": "od", "type": "fc", "stream": "oper", "step": "0", "levtype": "{}", "param": "{}", "_offset": {}, "_length": {}}}"#,
            levtype, param, offset, length
        )
    }

    /// Index with surface wind entries among unrelated messages.
    pub fn sample_index() -> String {
        [
            index_line("2t", "sfc", 0, 600),
            index_line("10u", "pl", 600, 600),
            index_line("10u", "sfc", SAMPLE_U_OFFSET, SAMPLE_U_LENGTH),
            index_line("10v", "sfc", SAMPLE_V_OFFSET, SAMPLE_V_LENGTH),
            index_line("msl", "sfc", 2_440, 500),
        ]
        .join("\n")
    }

    /// Index for chunks laid out back to back starting at offset 0.
    pub fn contiguous_index(u_length: u64, v_length: u64) -> String {
        [
            index_line("10u", "sfc", 0, u_length),
            index_line("10v", "sfc", u_length, v_length),
        ]
        .join("\n")
    }
}

/// `grib_dump -j` output.
pub mod grib_dump {
    /// A single-message dump whose `values` key holds `values`.
    pub fn grib_dump_output(values: &[f64]) -> String {
        let values = serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string());
        format!(
            r#"{{ "messages" : [
  [
    {{ "key" : "editionNumber", "value" : 2 }},
    {{ "key" : "shortName", "value" : "10u" }},
    {{ "key" : "values", "value" : {} }}
  ]
]}}"#,
            values
        )
    }
}

/// Hand-built GRIB2 messages.
pub mod grib2 {
    /// One GRIB2 message on a `packed.len()` x 1 lat/lon grid, simple
    /// packing at 8 bits with no scaling, so value `i` decodes to
    /// `reference + packed[i]`.
    pub fn simple_packed_message(reference: f32, packed: &[u8]) -> Vec<u8> {
        let points = packed.len() as u32;

        // Section 1: identification (ECMWF, 2024-01-01T00:00Z, forecast).
        let mut sect1 = section(1, &[0, 98, 0, 0, 2, 0, 1]);
        sect1.extend_from_slice(&2024u16.to_be_bytes());
        sect1.extend_from_slice(&[1, 1, 0, 0, 0, 0, 1]);
        set_length(&mut sect1);

        // Section 3: template 3.0, regular lat/lon.
        let mut sect3 = section(3, &[0]);
        sect3.extend_from_slice(&points.to_be_bytes());
        sect3.extend_from_slice(&[0, 0, 0, 0]);
        sect3.extend_from_slice(&[6]);
        sect3.extend_from_slice(&[0; 15]);
        sect3.extend_from_slice(&points.to_be_bytes());
        sect3.extend_from_slice(&1u32.to_be_bytes());
        sect3.extend_from_slice(&[0; 34]);
        set_length(&mut sect3);

        // Section 4: template 4.0, 10 m above ground, analysis.
        let mut sect4 = section(4, &[0, 0, 0, 0]);
        sect4.extend_from_slice(&[2, 2, 2, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]);
        sect4.extend_from_slice(&[103, 0, 0, 0, 0, 10, 255, 0, 0, 0, 0, 0]);
        set_length(&mut sect4);

        // Section 5: template 5.0, simple packing.
        let mut sect5 = section(5, &points.to_be_bytes());
        sect5.extend_from_slice(&0u16.to_be_bytes());
        sect5.extend_from_slice(&reference.to_be_bytes());
        sect5.extend_from_slice(&[0, 0, 0, 0, 8, 0]);
        set_length(&mut sect5);

        // Section 6: no bitmap.
        let mut sect6 = section(6, &[255]);
        set_length(&mut sect6);

        let mut sect7 = section(7, packed);
        set_length(&mut sect7);

        let body: Vec<u8> = [sect1, sect3, sect4, sect5, sect6, sect7].concat();
        let total = (16 + body.len() + 4) as u64;

        let mut message = b"GRIB".to_vec();
        message.extend_from_slice(&[0, 0, 0, 2]);
        message.extend_from_slice(&total.to_be_bytes());
        message.extend_from_slice(&body);
        message.extend_from_slice(b"7777");
        message
    }

    fn section(number: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0, 0, 0, 0, number];
        bytes.extend_from_slice(payload);
        bytes
    }

    fn set_length(section: &mut [u8]) {
        let length = section.len() as u32;
        section[..4].copy_from_slice(&length.to_be_bytes());
    }
}
