/// Two-column spectrum data: photon energy against absorption.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SpectrumData {
    pub title: String,
    pub energy: Vec<f64>,
    pub absorption: Vec<f64>,
}

impl SpectrumData {
    /// Parses whitespace separated columns, skipping headers, comments and
    /// lines whose first two fields are not numbers. Returns `None` when fewer
    /// than two points survive.
    pub fn parse(title: &str, text: &str) -> Option<SpectrumData> {
        let mut data = SpectrumData {
            title: title.to_string(),
            ..Default::default()
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut numbers = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|f| !f.is_empty());
            let (Some(x), Some(y)) = (numbers.next(), numbers.next()) else {
                continue;
            };
            let (Ok(x), Ok(y)) = (x.parse::<f64>(), y.parse::<f64>()) else {
                continue;
            };
            if !x.is_finite() || !y.is_finite() {
                continue;
            }

            data.energy.push(x);
            data.absorption.push(y);
        }

        if data.len() < 2 {
            return None;
        }

        return Some(data);
    }

    pub fn len(&self) -> usize {
        return self.energy.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.energy.is_empty();
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        return self
            .energy
            .iter()
            .copied()
            .zip(self.absorption.iter().copied())
            .collect();
    }

    pub fn energy_bounds(&self) -> [f64; 2] {
        return bounds(&self.energy);
    }

    pub fn absorption_bounds(&self) -> [f64; 2] {
        return bounds(&self.absorption);
    }
}

fn bounds(values: &[f64]) -> [f64; 2] {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if min == max {
        return [min - 1.0, max + 1.0];
    }

    return [min, max];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_two_column_text() {
        let text = "# energy mu\nE MU\n8300.0 0.12\n8301.5\t0.15 0.9\n\nbad line\n8303,0.2\n";
        let data = SpectrumData::parse("Ni_foil", text).unwrap();

        assert_eq!(data.energy, vec![8300.0, 8301.5, 8303.0]);
        assert_eq!(data.absorption, vec![0.12, 0.15, 0.2]);
        assert_eq!(data.energy_bounds(), [8300.0, 8303.0]);
        assert_eq!(data.points()[1], (8301.5, 0.15));
    }

    #[test]
    fn it_rejects_non_spectra() {
        assert!(SpectrumData::parse("x", "\u{89}PNG binary").is_none());
        assert!(SpectrumData::parse("x", "8300 0.1\n").is_none());
    }

    #[test]
    fn it_pads_flat_bounds() {
        let data = SpectrumData::parse("flat", "1 0.5\n2 0.5\n").unwrap();
        assert_eq!(data.absorption_bounds(), [-0.5, 1.5]);
    }
}
