pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

/// How steady the typing speed was, 0 (erratic) to 100 (constant).
/// Maps the coefficient of variation through a tanh curve.
pub fn consistency(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    if m <= 0.0 {
        return None;
    }
    let cv = std_dev(samples)? / m;
    let curve = (cv + cv.powi(3) / 3.0 + cv.powi(5) / 5.0).tanh();
    Some((100.0 * (1.0 - curve)).clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[42.0]), Some(42.0));
        assert_eq!(mean(&[-10.0, 0.0, 10.0]), Some(0.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        let sd = std_dev(&[100., 120., 90., 102., 94.]).unwrap();
        assert!((sd - 10.322790320451151).abs() < 1e-9);
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_consistency() {
        assert_eq!(consistency(&[60.0, 60.0, 60.0]), Some(100.0));
        assert_eq!(consistency(&[]), None);
        assert_eq!(consistency(&[0.0, 0.0]), None);

        let steady = consistency(&[58.0, 60.0, 62.0]).unwrap();
        let erratic = consistency(&[20.0, 90.0, 40.0]).unwrap();
        assert!(steady > 90.0);
        assert!(erratic < steady);
        assert!(erratic >= 0.0);
    }
}
