//! Text rendering of endpoint reads.

use ds28ea00::{CrcVerdict, Measurement, Scratchpad};

fn verdict_text(verdict: CrcVerdict) -> &'static str {
    match verdict {
        CrcVerdict::Valid => "YES",
        CrcVerdict::Invalid => "NO",
        CrcVerdict::NotChecked => "N/A",
    }
}

/// `b0 .. b8 : crc=cc YES|NO|N/A`, newline terminated.
pub fn scratchpad(pad: &Scratchpad) -> String {
    format!(
        "{pad} : crc={:02x} {}\n",
        pad.computed_crc(),
        verdict_text(pad.verdict())
    )
}

/// The scratchpad line, then `b0 .. b8 t=<int>.<sixteenths>`.
pub fn therm(m: &Measurement) -> String {
    let mut out = scratchpad(&m.scratchpad);
    out.push_str(&format!(
        "{} t={}.{}\n",
        m.scratchpad,
        m.temperature.integer_part(),
        m.temperature.fraction_sixteenths()
    ));
    out
}

/// `status=<HEX>`.
pub fn pio_status(status: u8) -> String {
    format!("status={status:X}\n")
}
