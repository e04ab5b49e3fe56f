use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::state_space::{StateSpace, Transition};

/// Bellman backup of one transition list against a value table. Terminal
/// rows contribute their reward only; missing successors count as zero.
fn backup(transitions: &[Transition], values: &BTreeMap<String, f64>, gamma: f64) -> f64 {
    transitions
        .iter()
        .map(|t| {
            if t.terminal {
                t.probability * t.reward
            } else {
                let v = values.get(&t.next_state).copied().unwrap_or(0.0);
                t.probability * (t.reward + gamma * v)
            }
        })
        .sum()
}

#[derive(Debug, Serialize)]
pub struct PolicyIterationResult {
    pub values: BTreeMap<String, f64>,
    pub policy: BTreeMap<String, String>,
    pub iterations: usize,
}

/// Exact tabular policy iteration over the artifact: evaluation sweeps to
/// convergence, greedy improvement, repeat until the policy is stable.
pub fn policy_iteration(space: &StateSpace, gamma: f64, epsilon: f64) -> PolicyIterationResult {
    let mut policy: BTreeMap<String, String> = space
        .iter()
        .filter_map(|(state, actions)| {
            actions.keys().next().map(|a| (state.clone(), a.clone()))
        })
        .collect();

    let mut iterations = 0;
    loop {
        let values = policy_evaluation(space, &policy, gamma, epsilon);
        let improved = policy_improvement(space, &values, gamma);
        iterations += 1;
        if improved == policy {
            return PolicyIterationResult {
                values,
                policy,
                iterations,
            };
        }
        policy = improved;
    }
}

fn policy_evaluation(
    space: &StateSpace,
    policy: &BTreeMap<String, String>,
    gamma: f64,
    epsilon: f64,
) -> BTreeMap<String, f64> {
    let mut prev: BTreeMap<String, f64> = space.keys().map(|k| (k.clone(), 0.0)).collect();
    loop {
        let mut values = BTreeMap::new();
        let mut delta: f64 = 0.0;
        for (state, actions) in space {
            let chosen = policy.get(state).and_then(|a| actions.get(a));
            let v = chosen.map_or(0.0, |transitions| backup(transitions, &prev, gamma));
            delta = delta.max((v - prev.get(state).copied().unwrap_or(0.0)).abs());
            values.insert(state.clone(), v);
        }
        if delta < epsilon {
            return values;
        }
        prev = values;
    }
}

fn policy_improvement(
    space: &StateSpace,
    values: &BTreeMap<String, f64>,
    gamma: f64,
) -> BTreeMap<String, String> {
    let mut improved = BTreeMap::new();
    for (state, actions) in space {
        let mut best: Option<(&String, f64)> = None;
        for (action, transitions) in actions {
            let q = backup(transitions, values, gamma);
            if best.map_or(true, |(_, bq)| q > bq) {
                best = Some((action, q));
            }
        }
        if let Some((action, _)) = best {
            improved.insert(state.clone(), action.clone());
        }
    }
    improved
}

#[derive(Debug, Serialize)]
pub struct QLearningModel {
    #[serde(rename = "Q")]
    pub q: BTreeMap<String, BTreeMap<String, f64>>,
    pub policy: BTreeMap<String, String>,
    pub episode_num: u64,
}

/// Tabular epsilon-greedy Q-learning, sampling episodes from the artifact's
/// transition lists instead of live play. Alpha and epsilon decay as
/// `episode_num^(-1/4)` from 1.0.
pub struct QLearning<'a> {
    space: &'a StateSpace,
    roots: Vec<String>,
    pub model: QLearningModel,
    gamma: f64,
    initial_epsilon: f64,
    initial_alpha: f64,
    decay: f64,
    rng: StdRng,
}

impl<'a> QLearning<'a> {
    pub fn new(space: &'a StateSpace, seed: u64) -> QLearning<'a> {
        QLearning {
            space,
            roots: episode_roots(space),
            model: QLearningModel {
                q: BTreeMap::new(),
                policy: BTreeMap::new(),
                episode_num: 0,
            },
            gamma: 1.0,
            initial_epsilon: 1.0,
            initial_alpha: 1.0,
            decay: -0.25,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn epsilon(&self) -> f64 {
        if self.model.episode_num == 0 {
            self.initial_epsilon
        } else {
            self.initial_epsilon * (self.model.episode_num as f64).powf(self.decay)
        }
    }

    fn alpha(&self) -> f64 {
        if self.model.episode_num == 0 {
            self.initial_alpha
        } else {
            self.initial_alpha * (self.model.episode_num as f64).powf(self.decay)
        }
    }

    pub fn train(&mut self, episodes: u64) {
        for _ in 0..episodes {
            self.run_episode();
        }
    }

    fn run_episode(&mut self) {
        let Some(mut state) = self.roots.choose(&mut self.rng).cloned() else {
            return;
        };

        loop {
            let Some(actions) = self.space.get(&state) else {
                return;
            };
            self.touch(&state, actions);

            let action = if self.rng.gen_bool(self.epsilon().min(1.0)) {
                let keys: Vec<&String> = actions.keys().collect();
                match keys.choose(&mut self.rng) {
                    Some(k) => (*k).clone(),
                    None => return,
                }
            } else {
                match self.model.policy.get(&state) {
                    Some(a) => a.clone(),
                    None => return,
                }
            };

            let Some(transitions) = actions.get(&action) else {
                return;
            };
            let Some(outcome) = sample(transitions, &mut self.rng) else {
                return;
            };
            let (next_state, reward, terminal) =
                (outcome.next_state.clone(), outcome.reward, outcome.terminal);

            let alpha = self.alpha();
            if terminal {
                let old = self.q_value(&state, &action);
                self.set_q(&state, &action, old + alpha * (reward - old));
                self.refresh_policy(&state);
                self.model.episode_num += 1;
                return;
            }

            if let Some(next_actions) = self.space.get(&next_state) {
                self.touch(&next_state, next_actions);
            }
            let best_next = self
                .model
                .q
                .get(&next_state)
                .and_then(|qs| qs.values().copied().fold(None, |m: Option<f64>, v| {
                    Some(m.map_or(v, |m| m.max(v)))
                }))
                .unwrap_or(0.0);
            let old = self.q_value(&state, &action);
            self.set_q(
                &state,
                &action,
                old + alpha * (reward + self.gamma * best_next - old),
            );
            self.refresh_policy(&state);

            state = next_state;
        }
    }

    /// Initialize Q entries and a default policy for a newly seen state.
    fn touch(&mut self, state: &str, actions: &BTreeMap<String, Vec<Transition>>) {
        if !self.model.q.contains_key(state) {
            self.model.q.insert(
                state.to_string(),
                actions.keys().map(|a| (a.clone(), 0.0)).collect(),
            );
        }
        if !self.model.policy.contains_key(state) {
            if let Some(first) = actions.keys().next() {
                self.model.policy.insert(state.to_string(), first.clone());
            }
        }
    }

    fn q_value(&self, state: &str, action: &str) -> f64 {
        self.model
            .q
            .get(state)
            .and_then(|qs| qs.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    fn set_q(&mut self, state: &str, action: &str, value: f64) {
        if let Some(qs) = self.model.q.get_mut(state) {
            qs.insert(action.to_string(), value);
        }
    }

    fn refresh_policy(&mut self, state: &str) {
        let best = self.model.q.get(state).and_then(|qs| {
            qs.iter()
                .fold(None::<(&String, f64)>, |acc, (a, &v)| match acc {
                    Some((_, bv)) if bv >= v => acc,
                    _ => Some((a, v)),
                })
                .map(|(a, _)| a.clone())
        });
        if let Some(best) = best {
            self.model.policy.insert(state.to_string(), best);
        }
    }
}

/// The hero's first decision states: round 1 at the blind contribution.
fn episode_roots(space: &StateSpace) -> Vec<String> {
    space
        .keys()
        .filter(|key| {
            let fields: Vec<&str> = key.split('_').collect();
            fields.len() == 6
                && fields[1] == "0.5"
                && fields[4] == "none"
                && (fields[0] == "second" || fields[2] == "0")
        })
        .cloned()
        .collect()
}

fn sample<'t>(transitions: &'t [Transition], rng: &mut StdRng) -> Option<&'t Transition> {
    let mut roll: f64 = rng.gen();
    for t in transitions {
        roll -= t.probability;
        if roll <= 0.0 {
            return Some(t);
        }
    }
    transitions.last()
}
