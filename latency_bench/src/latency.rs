use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyBreakdown {
    /// No network is involved; the whole measurement is inference.
    Local { inference_ms: f64 },
    /// `network_ms` is what remains of the total after the server's own
    /// inference time. It can come out negative on timer noise and is kept as is.
    Remote { network_ms: f64, inference_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyMeasurement {
    pub total_ms: f64,
    pub breakdown: LatencyBreakdown,
}

impl LatencyMeasurement {
    pub fn local(total_ms: f64) -> Self {
        Self {
            total_ms,
            breakdown: LatencyBreakdown::Local {
                inference_ms: total_ms,
            },
        }
    }

    pub fn remote(total_ms: f64, server_inference_ms: f64) -> Self {
        Self {
            total_ms,
            breakdown: LatencyBreakdown::Remote {
                network_ms: total_ms - server_inference_ms,
                inference_ms: server_inference_ms,
            },
        }
    }

    pub fn network_ms(&self) -> f64 {
        match self.breakdown {
            LatencyBreakdown::Local { .. } => 0.0,
            LatencyBreakdown::Remote { network_ms, .. } => network_ms,
        }
    }

    pub fn inference_ms(&self) -> f64 {
        match self.breakdown {
            LatencyBreakdown::Local { inference_ms } => inference_ms,
            LatencyBreakdown::Remote { inference_ms, .. } => inference_ms,
        }
    }
}

pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

pub fn elapsed_ms(start: Instant) -> f64 {
    duration_ms(start.elapsed())
}
