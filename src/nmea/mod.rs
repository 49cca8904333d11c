use std::fmt;
use chrono::{DateTime, Utc};
use crate::error::SentenceError;
use crate::kinematics::VesselState;
use crate::kinematics::geo::wrap360;

pub const MPS_TO_KNOTS: f64 = 1.94384;

//hemisphere letters are fixed, southern/western positions are not supported
const LAT_HEMISPHERE: &str = "N";
const LON_HEMISPHERE: &str = "E";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind{
    Heading,
    PositionVelocity,
}

impl SentenceKind{
    pub fn talker_id(&self) -> &'static str{
        match self{
            SentenceKind::Heading => "GPHDT",
            SentenceKind::PositionVelocity => "GPRMC",
        }
    }
}

/// One outgoing navigation sentence.
///
/// Rendered as `$<body>*<HH>` where `HH` is the XOR of all body bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence{
    /// `$GPHDT,<heading>,T`
    Heading{
        heading_deg: f64,
    },
    /// `$GPRMC,<HHMMSS>,A,<lat>,N,<lon>,E,<knots>,<heading>,<DDMMYY>,,,`
    PositionVelocity{
        time: DateTime<Utc>,
        latitude_ddmm: f64,
        longitude_ddmm: f64,
        speed_knots: f64,
        heading_deg: f64,
    },
}

impl Sentence{
    pub fn heading(state: &VesselState) -> Self{
        Sentence::Heading{ heading_deg: state.heading_deg }
    }

    pub fn position_velocity(state: &VesselState, time: DateTime<Utc>) -> Self{
        Sentence::PositionVelocity{
            time,
            latitude_ddmm: state.latitude_ddmm,
            longitude_ddmm: state.longitude_ddmm,
            speed_knots: state.speed_mps * MPS_TO_KNOTS,
            heading_deg: state.heading_deg,
        }
    }

    pub fn kind(&self) -> SentenceKind{
        match self{
            Sentence::Heading{ .. } => SentenceKind::Heading,
            Sentence::PositionVelocity{ .. } => SentenceKind::PositionVelocity,
        }
    }

    /// Fields following the talker id, in wire order.
    pub fn fields(&self) -> Vec<String>{
        match self{
            Sentence::Heading{ heading_deg } =>{
                vec![format_heading(*heading_deg), "T".to_string()]
            }
            Sentence::PositionVelocity{ time, latitude_ddmm, longitude_ddmm, speed_knots, heading_deg } =>{
                vec![
                    time.format("%H%M%S").to_string(),
                    "A".to_string(),
                    format_ddmm(*latitude_ddmm, 2),
                    LAT_HEMISPHERE.to_string(),
                    format_ddmm(*longitude_ddmm, 3),
                    LON_HEMISPHERE.to_string(),
                    format!("{:.2}", speed_knots.max(0.0)),
                    format_heading(*heading_deg),
                    time.format("%d%m%y").to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]
            }
        }
    }

    /// Everything between `$` and `*`.
    pub fn body(&self) -> String{
        let mut body = self.kind().talker_id().to_string();
        for field in self.fields(){
            body.push(',');
            body.push_str(&field);
        }
        body
    }

    pub fn checksum(&self) -> u8{
        checksum(self.body().as_bytes())
    }

    pub fn to_bytes(&self) -> Vec<u8>{
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Sentence{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result{
        let body = self.body();
        write!(f, "${}*{:02X}", body, checksum(body.as_bytes()))
    }
}

/// Both sentences of one tick, heading first.
pub fn encode_tick(state: &VesselState, time: DateTime<Utc>) -> [Sentence; 2]{
    [Sentence::heading(state), Sentence::position_velocity(state, time)]
}

/// Running XOR over the body bytes.
pub fn checksum(body: &[u8]) -> u8{
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Checks the `*HH` suffix of a received sentence and returns its body.
/// A trailing CR/LF is ignored.
pub fn verify(text: &str) -> Result<&str, SentenceError>{
    let text = text.trim_end_matches(['\r', '\n']);
    let rest = text.strip_prefix('$').ok_or(SentenceError::MissingStart)?;
    let (body, found) = rest.rsplit_once('*').ok_or(SentenceError::MissingChecksum)?;

    if found.len() != 2{
        return Err(SentenceError::MissingChecksum);
    }

    let computed = checksum(body.as_bytes());
    match u8::from_str_radix(found, 16){
        Ok(value) if value == computed => Ok(body),
        _ => Err(SentenceError::ChecksumMismatch{ computed, found: found.to_string() }),
    }
}

/// Splits a byte stream holding one or more concatenated sentences.
pub fn split_sentences(data: &str) -> Vec<&str>{
    let mut sentences = Vec::new();
    let mut start = None;

    for (i, c) in data.char_indices(){
        if c == '$'{
            if let Some(s) = start{
                sentences.push(data[s..i].trim_end());
            }
            start = Some(i);
        }
    }
    if let Some(s) = start{
        sentences.push(data[s..].trim_end());
    }
    sentences
}

/// Heading with one decimal, never rendered as `360.0`.
pub fn format_heading(heading_deg: f64) -> String{
    let rounded = (wrap360(heading_deg) * 10.0).round() / 10.0;
    let rounded = if rounded >= 360.0 { 0.0 } else { rounded };
    format!("{:.1}", rounded)
}

/// `DDMM.mmmm` (or `DDDMM.mmmm` with `degree_digits = 3`), zero padded.
/// Minutes that round up to 60 carry into the degrees.
pub fn format_ddmm(ddmm: f64, degree_digits: usize) -> String{
    let ddmm = ddmm.abs();
    let mut degrees = (ddmm / 100.0).trunc() as u32;
    let mut minutes = ((ddmm - degrees as f64 * 100.0) * 10_000.0).round() / 10_000.0;

    if minutes >= 60.0{
        degrees += 1;
        minutes -= 60.0;
    }

    format!("{:0width$}{:07.4}", degrees, minutes, width = degree_digits)
}
