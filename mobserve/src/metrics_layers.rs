//! Metrics-based middleware for agent runs.

use std::sync::Arc;
use std::time::Instant;

use magent::{AgentHandler, AgentLayer, agent_handler};
use mcommon::layer;

/// Records run counters and duration histograms through the `metrics`
/// facade.
pub fn metrics_agent_layer() -> AgentLayer {
    layer(|next: AgentHandler| {
        agent_handler(move |request| {
            let next = Arc::clone(&next);
            async move {
                metrics::counter!("marionette_agent_run_start_total").increment(1);
                let start = Instant::now();

                match next(request).await {
                    Ok(response) => {
                        metrics::counter!("marionette_agent_run_success_total").increment(1);
                        metrics::histogram!(
                            "marionette_agent_run_duration_seconds",
                            "status" => "success"
                        )
                        .record(start.elapsed().as_secs_f64());
                        metrics::counter!("marionette_agent_run_total_tokens")
                            .increment(u64::from(response.usage.total_tokens));
                        Ok(response)
                    }
                    Err(error) => {
                        metrics::counter!(
                            "marionette_agent_run_failure_total",
                            "error_kind" => format!("{:?}", error.kind)
                        )
                        .increment(1);
                        metrics::histogram!(
                            "marionette_agent_run_duration_seconds",
                            "status" => "failure"
                        )
                        .record(start.elapsed().as_secs_f64());
                        Err(error)
                    }
                }
            }
        })
    })
}
