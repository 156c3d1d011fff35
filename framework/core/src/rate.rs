use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// A request rate in the form `<count>/<unit>`, for example `5/s` or `300/m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    freq: u64,
    unit: RateUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RateUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl RateUnit {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ns" => Some(Self::Nanosecond),
            "us" | "µs" => Some(Self::Microsecond),
            "ms" => Some(Self::Millisecond),
            "s" => Some(Self::Second),
            "m" => Some(Self::Minute),
            "h" => Some(Self::Hour),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Nanosecond => "ns",
            Self::Microsecond => "us",
            Self::Millisecond => "ms",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
        }
    }

    fn duration(&self) -> Duration {
        match self {
            Self::Nanosecond => Duration::from_nanos(1),
            Self::Microsecond => Duration::from_micros(1),
            Self::Millisecond => Duration::from_millis(1),
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(3600),
        }
    }
}

impl Rate {
    /// Number of requests issued per unit of time.
    pub fn freq(&self) -> u64 {
        self.freq
    }

    /// The time unit the frequency is expressed over.
    pub fn per(&self) -> Duration {
        self.unit.duration()
    }

    /// The pause between two consecutive requests at this rate.
    ///
    /// Never shorter than one nanosecond.
    pub fn interval(&self) -> Duration {
        let nanos = self.per().as_nanos() / u128::from(self.freq);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX).max(1))
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.freq, self.unit.as_str())
    }
}

impl FromStr for Rate {
    type Err = RateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, unit) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| RateParseError::new(s, "expected the form <count>/<unit>"))?;

        let freq = count
            .parse::<u64>()
            .map_err(|_| RateParseError::new(s, "count is not a whole number"))?;
        if freq == 0 {
            return Err(RateParseError::new(s, "count must be greater than zero"));
        }

        let unit = RateUnit::parse(unit).ok_or_else(|| {
            RateParseError::new(s, "unit must be one of 'ns', 'us', 'ms', 's', 'm', 'h'")
        })?;

        Ok(Self { freq, unit })
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug, PartialEq)]
#[display("invalid rate '{input}': {reason}")]
pub struct RateParseError {
    input: String,
    reason: &'static str,
}

impl RateParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}
