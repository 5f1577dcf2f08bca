/// Recent observations for one symbol, oldest first.
///
/// `volumes`, when present, runs parallel to `closes`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    pub symbol: String,
    pub closes: Vec<f64>,
    pub volumes: Option<Vec<f64>>,
}

impl SampleSeries {
    pub fn from_closes(symbol: impl Into<String>, closes: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            closes,
            volumes: None,
        }
    }

    pub fn with_volumes(symbol: impl Into<String>, closes: Vec<f64>, volumes: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            closes,
            volumes: Some(volumes),
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}
