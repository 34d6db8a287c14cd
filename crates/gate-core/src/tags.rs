#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub metric: &'static str,
    pub help: &'static str,
}

pub const INHIBITED: Tag = Tag {
    metric: "turntable_gate_inhibited",
    help: "1 while ball release is inhibited, 0 otherwise",
};

pub const REMAINING_COOLDOWN_ROUNDS: Tag = Tag {
    metric: "turntable_gate_remaining_cooldown_rounds",
    help: "Coarse rounds left before release is allowed again",
};

pub const LAST_ROUND_DURATION_US: Tag = Tag {
    metric: "turntable_gate_last_round_duration_microseconds",
    help: "Most recent fine-sensor round duration",
};

pub const PERIOD_S: Tag = Tag {
    metric: "turntable_gate_period_seconds",
    help: "Current rotation period of the turntable",
};

pub const INHIBITIONS_ARMED: Tag = Tag {
    metric: "turntable_gate_inhibitions_armed_total",
    help: "Fine observations that (re)armed the cooldown",
};

pub const FINE_OBSERVATIONS: Tag = Tag {
    metric: "turntable_gate_fine_observations_total",
    help: "Round durations reported by the fine sensor",
};

pub const COARSE_OBSERVATIONS: Tag = Tag {
    metric: "turntable_gate_coarse_observations_total",
    help: "Rounds reported by the coarse sensor",
};

pub const CYCLES_EXECUTED: Tag = Tag {
    metric: "turntable_gate_cycles_executed_total",
    help: "Gate loop cycles executed",
};
