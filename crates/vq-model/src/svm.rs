use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};
use crate::predictor::RegressionPredictor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvmKernel {
    Linear,
    Polynomial { gamma: f64, coef0: f64, degree: i32 },
    Rbf { gamma: f64 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl SvmKernel {
    fn eval(&self, sv: &SupportVector, x: &[f64], x_norm_sq: f64) -> f64 {
        let dot = sv.dot(x);
        match *self {
            SvmKernel::Linear => dot,
            SvmKernel::Polynomial {
                gamma,
                coef0,
                degree,
            } => (gamma * dot + coef0).powi(degree),
            SvmKernel::Rbf { gamma } => {
                let dist_sq = (x_norm_sq + sv.norm_sq - 2.0 * dot).max(0.0);
                (-gamma * dist_sq).exp()
            }
            SvmKernel::Sigmoid { gamma, coef0 } => (gamma * dot + coef0).tanh(),
        }
    }
}

impl fmt::Display for SvmKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SvmKernel::Linear => "linear",
            SvmKernel::Polynomial { .. } => "polynomial",
            SvmKernel::Rbf { .. } => "rbf",
            SvmKernel::Sigmoid { .. } => "sigmoid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SupportVector {
    coef: f64,
    /// `(zero-based index, value)` pairs in ascending index order.
    values: Vec<(usize, f64)>,
    norm_sq: f64,
}

impl SupportVector {
    fn dot(&self, x: &[f64]) -> f64 {
        self.values
            .iter()
            .map(|&(idx, v)| v * x.get(idx).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Support-vector regression model in libsvm's text format
/// (`epsilon_svr` or `nu_svr`).
#[derive(Debug, Clone, PartialEq)]
pub struct SvmModel {
    kernel: SvmKernel,
    rho: f64,
    support_vectors: Vec<SupportVector>,
    max_index: usize,
}

#[derive(Default)]
struct Header {
    svm_type: Option<String>,
    kernel_type: Option<String>,
    degree: Option<i32>,
    gamma: Option<f64>,
    coef0: Option<f64>,
    rho: Option<f64>,
    total_sv: Option<usize>,
}

fn parse_number<T: FromStr>(line: usize, key: &str, raw: Option<&str>) -> ModelResult<T> {
    raw.and_then(|v| v.parse().ok())
        .ok_or_else(|| ModelError::InvalidLibsvm {
            line,
            reason: format!("invalid value for '{key}'"),
        })
}

impl SvmModel {
    pub fn from_file(path: &Path) -> ModelResult<Self> {
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn kernel(&self) -> SvmKernel {
        self.kernel
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn support_vector_count(&self) -> usize {
        self.support_vectors.len()
    }

    fn build_kernel(header: &Header, line: usize) -> ModelResult<SvmKernel> {
        let missing = |key: &str| ModelError::InvalidLibsvm {
            line,
            reason: format!("kernel requires '{key}'"),
        };
        let kernel = header
            .kernel_type
            .as_deref()
            .ok_or_else(|| missing("kernel_type"))?;
        match kernel {
            "linear" => Ok(SvmKernel::Linear),
            "polynomial" => Ok(SvmKernel::Polynomial {
                gamma: header.gamma.ok_or_else(|| missing("gamma"))?,
                coef0: header.coef0.unwrap_or(0.0),
                degree: header.degree.unwrap_or(3),
            }),
            "rbf" => Ok(SvmKernel::Rbf {
                gamma: header.gamma.ok_or_else(|| missing("gamma"))?,
            }),
            "sigmoid" => Ok(SvmKernel::Sigmoid {
                gamma: header.gamma.ok_or_else(|| missing("gamma"))?,
                coef0: header.coef0.unwrap_or(0.0),
            }),
            other => Err(ModelError::InvalidLibsvm {
                line,
                reason: format!("unsupported kernel_type '{other}'"),
            }),
        }
    }
}

impl FromStr for SvmModel {
    type Err = ModelError;

    fn from_str(text: &str) -> ModelResult<Self> {
        let mut header = Header::default();
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));
        let mut sv_line = None;

        for (no, line) in lines.by_ref() {
            if line.is_empty() {
                continue;
            }
            if line == "SV" {
                sv_line = Some(no);
                break;
            }
            let mut parts = line.split_whitespace();
            let key = parts.next().unwrap_or_default();
            let value = parts.next();
            match key {
                "svm_type" => header.svm_type = value.map(str::to_string),
                "kernel_type" => header.kernel_type = value.map(str::to_string),
                "degree" => header.degree = Some(parse_number(no, key, value)?),
                "gamma" => header.gamma = Some(parse_number(no, key, value)?),
                "coef0" => header.coef0 = Some(parse_number(no, key, value)?),
                "rho" => header.rho = Some(parse_number(no, key, value)?),
                "total_sv" => header.total_sv = Some(parse_number(no, key, value)?),
                "nr_class" | "label" | "nr_sv" | "probA" | "probB" => {}
                other => {
                    return Err(ModelError::InvalidLibsvm {
                        line: no,
                        reason: format!("unknown header key '{other}'"),
                    });
                }
            }
        }

        let sv_line = sv_line.ok_or_else(|| ModelError::InvalidLibsvm {
            line: text.lines().count(),
            reason: "missing 'SV' section".into(),
        })?;
        match header.svm_type.as_deref() {
            Some("epsilon_svr" | "nu_svr") => {}
            other => {
                return Err(ModelError::InvalidLibsvm {
                    line: sv_line,
                    reason: format!("unsupported svm_type {other:?}, expected a regression model"),
                });
            }
        }
        let kernel = Self::build_kernel(&header, sv_line)?;
        let rho = header.rho.ok_or_else(|| ModelError::InvalidLibsvm {
            line: sv_line,
            reason: "missing 'rho'".into(),
        })?;

        let mut support_vectors = Vec::new();
        let mut max_index = 0;
        for (no, line) in lines {
            if line.is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let coef: f64 = parse_number(no, "coefficient", tokens.next())?;
            let mut values = Vec::new();
            let mut last = 0;
            for token in tokens {
                let (idx, value) = token.split_once(':').ok_or_else(|| {
                    ModelError::InvalidLibsvm {
                        line: no,
                        reason: format!("expected 'index:value', got '{token}'"),
                    }
                })?;
                let idx: usize = parse_number(no, "index", Some(idx))?;
                let value: f64 = parse_number(no, "value", Some(value))?;
                if idx <= last {
                    return Err(ModelError::InvalidLibsvm {
                        line: no,
                        reason: "feature indices must be positive and ascending".into(),
                    });
                }
                last = idx;
                values.push((idx - 1, value));
            }
            max_index = max_index.max(last);
            let norm_sq = values.iter().map(|(_, v)| v * v).sum();
            support_vectors.push(SupportVector {
                coef,
                values,
                norm_sq,
            });
        }

        if support_vectors.is_empty() {
            return Err(ModelError::InvalidLibsvm {
                line: sv_line,
                reason: "model has no support vectors".into(),
            });
        }
        if let Some(total) = header.total_sv {
            if total != support_vectors.len() {
                return Err(ModelError::InvalidLibsvm {
                    line: sv_line,
                    reason: format!(
                        "total_sv is {total} but {} support vectors follow",
                        support_vectors.len()
                    ),
                });
            }
        }

        Ok(Self {
            kernel,
            rho,
            support_vectors,
            max_index,
        })
    }
}

impl RegressionPredictor for SvmModel {
    fn dimension(&self) -> Option<usize> {
        Some(self.max_index)
    }

    fn predict_one(&self, x: &[f64]) -> ModelResult<f64> {
        if x.len() < self.max_index {
            return Err(ModelError::DimensionMismatch {
                expected: self.max_index,
                actual: x.len(),
            });
        }
        let x_norm_sq: f64 = x.iter().map(|v| v * v).sum();
        let sum: f64 = self
            .support_vectors
            .iter()
            .map(|sv| sv.coef * self.kernel.eval(sv, x, x_norm_sq))
            .sum();
        Ok(sum - self.rho)
    }
}
