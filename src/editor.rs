use crate::api::flags::{FeatureFlag, FlagValueType, ReplaceRulesRequest, RuleInput};
use crate::console::Console;
use crate::error::ApiError;
use serde_json::Value;
use uuid::Uuid;

/// One targeting rule in the edit buffer. `local_id` is a synthetic handle
/// owned by the editor; it never leaves the client, so list operations work
/// regardless of what the server has or hasn't acknowledged.
#[derive(Debug, Clone)]
pub struct RuleDraft {
    pub local_id: u64,
    /// None means the rule applies to all users.
    pub segment_id: Option<Uuid>,
    pub rollout_percentage: i32,
    pub enabled: bool,
    pub value: Value,
}

/// In-memory editor for one flag's ordered targeting-rule list.
///
/// All edits are local until [`save`](Self::save), which replaces the whole
/// list server-side in one call. List order is evaluation priority and is
/// preserved exactly on save. A failed save keeps every local edit.
#[derive(Debug, Clone)]
pub struct RuleEditor {
    project_key: String,
    environment_id: Uuid,
    flag_key: String,
    value_type: FlagValueType,
    rules: Vec<RuleDraft>,
    next_local_id: u64,
    dirty: bool,
}

impl RuleEditor {
    /// Build an edit buffer from a fetched flag. Each server rule gets a
    /// fresh local id and a flat segment reference.
    pub fn load(flag: &FeatureFlag) -> Self {
        let mut next_local_id = 0;
        let rules = flag
            .rules
            .iter()
            .map(|rule| {
                next_local_id += 1;
                RuleDraft {
                    local_id: next_local_id,
                    segment_id: rule.segment.as_ref().map(|s| s.id),
                    rollout_percentage: rule.rollout_percentage,
                    enabled: rule.enabled,
                    value: rule.value.clone(),
                }
            })
            .collect();

        Self {
            project_key: flag.project_key.clone(),
            environment_id: flag.environment_id,
            flag_key: flag.key.clone(),
            value_type: flag.value_type,
            rules,
            next_local_id,
            dirty: false,
        }
    }

    pub fn rules(&self) -> &[RuleDraft] {
        &self.rules
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn value_type(&self) -> FlagValueType {
        self.value_type
    }

    /// Append a rule targeting all users at full rollout, with the value
    /// seeded by the flag's type. Returns the new rule's local id.
    pub fn add_rule(&mut self) -> u64 {
        self.next_local_id += 1;
        let local_id = self.next_local_id;
        self.rules.push(RuleDraft {
            local_id,
            segment_id: None,
            rollout_percentage: 100,
            enabled: true,
            value: self.value_type.seed_value(),
        });
        self.dirty = true;
        local_id
    }

    /// Remove by local id. The list may end up empty; unlike segments,
    /// flags have no minimum rule count.
    pub fn remove_rule(&mut self, local_id: u64) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.local_id != local_id);
        let removed = self.rules.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Swap the rule at `index` with its predecessor. Out of range is a no-op.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.rules.len() {
            return false;
        }
        self.rules.swap(index - 1, index);
        self.dirty = true;
        true
    }

    /// Swap the rule at `index` with its successor. Out of range is a no-op.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.rules.len() {
            return false;
        }
        self.rules.swap(index, index + 1);
        self.dirty = true;
        true
    }

    pub fn set_segment(&mut self, local_id: u64, segment_id: Option<Uuid>) -> bool {
        self.edit(local_id, |rule| rule.segment_id = segment_id)
    }

    /// Set the rollout percentage, clamped to 0..=100.
    pub fn set_rollout(&mut self, local_id: u64, percentage: i32) -> bool {
        let clamped = percentage.clamp(0, 100);
        self.edit(local_id, |rule| rule.rollout_percentage = clamped)
    }

    pub fn set_value(&mut self, local_id: u64, value: Value) -> bool {
        self.edit(local_id, |rule| rule.value = value)
    }

    pub fn set_enabled(&mut self, local_id: u64, enabled: bool) -> bool {
        self.edit(local_id, |rule| rule.enabled = enabled)
    }

    fn edit(&mut self, local_id: u64, apply: impl FnOnce(&mut RuleDraft)) -> bool {
        match self.rules.iter_mut().find(|r| r.local_id == local_id) {
            Some(rule) => {
                apply(rule);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// The full list in its current order, ready to submit. Rollout is
    /// clamped again here so out-of-range values cannot reach the wire even
    /// if a draft was constructed by hand.
    pub fn to_inputs(&self) -> Vec<RuleInput> {
        self.rules
            .iter()
            .map(|rule| RuleInput {
                segment_id: rule.segment_id,
                rollout_percentage: rule.rollout_percentage.clamp(0, 100),
                enabled: rule.enabled,
                value: rule.value.clone(),
            })
            .collect()
    }

    /// Replace the flag's rule list server-side with the buffer's content.
    /// Success clears the dirty flag (and the console invalidates the flag's
    /// cache scope); failure keeps every local edit for the next attempt.
    pub async fn save(&mut self, console: &Console) -> Result<FeatureFlag, ApiError> {
        let payload = ReplaceRulesRequest {
            rules: self.to_inputs(),
        };
        let flag = console
            .replace_flag_rules(
                &self.project_key,
                self.environment_id,
                &self.flag_key,
                &payload,
            )
            .await?;
        self.dirty = false;
        Ok(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::flags::{SegmentRef, TargetingRule};
    use chrono::Utc;
    use serde_json::json;

    fn flag_with_rules(value_type: FlagValueType, rules: Vec<TargetingRule>) -> FeatureFlag {
        FeatureFlag {
            project_key: "web".to_string(),
            environment_id: Uuid::new_v4(),
            key: "dark-mode".to_string(),
            name: "Dark mode".to_string(),
            description: None,
            value_type,
            enabled: true,
            default_value: json!(false),
            rules,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn server_rule(segment: Option<Uuid>, rollout: i32, value: Value) -> TargetingRule {
        TargetingRule {
            segment: segment.map(|id| SegmentRef {
                id,
                name: "beta".to_string(),
            }),
            rollout_percentage: rollout,
            enabled: true,
            value,
        }
    }

    #[test]
    fn test_load_then_save_is_identity() {
        let segment_id = Uuid::new_v4();
        let flag = flag_with_rules(
            FlagValueType::Boolean,
            vec![
                server_rule(Some(segment_id), 25, json!(true)),
                server_rule(None, 100, json!(false)),
            ],
        );

        let editor = RuleEditor::load(&flag);
        assert!(!editor.is_dirty());

        let inputs = editor.to_inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].segment_id, Some(segment_id));
        assert_eq!(inputs[0].rollout_percentage, 25);
        assert_eq!(inputs[0].value, json!(true));
        assert_eq!(inputs[1].segment_id, None);
        assert_eq!(inputs[1].rollout_percentage, 100);
        assert_eq!(inputs[1].value, json!(false));
    }

    #[test]
    fn test_add_rule_seeds_by_value_type() {
        for (value_type, expected) in [
            (FlagValueType::Boolean, json!(true)),
            (FlagValueType::Number, json!(0)),
            (FlagValueType::Json, json!({})),
            (FlagValueType::String, json!("")),
        ] {
            let flag = flag_with_rules(value_type, vec![]);
            let mut editor = RuleEditor::load(&flag);
            let id = editor.add_rule();

            let rule = &editor.rules()[0];
            assert_eq!(rule.local_id, id);
            assert_eq!(rule.segment_id, None);
            assert_eq!(rule.rollout_percentage, 100);
            assert!(rule.enabled);
            assert_eq!(rule.value, expected);
            assert!(editor.is_dirty());
        }
    }

    #[test]
    fn test_reorder_is_a_pure_permutation() {
        let flag = flag_with_rules(FlagValueType::Number, vec![]);
        let mut editor = RuleEditor::load(&flag);

        let a = editor.add_rule();
        let b = editor.add_rule();
        let c = editor.add_rule();
        editor.set_value(a, json!(1));
        editor.set_value(b, json!(2));
        editor.set_value(c, json!(3));

        // [1,2,3] -> [2,1,3] -> [2,3,1]
        assert!(editor.move_up(1));
        assert!(editor.move_down(1));

        let order: Vec<Value> = editor.to_inputs().into_iter().map(|r| r.value).collect();
        assert_eq!(order, vec![json!(2), json!(3), json!(1)]);
    }

    #[test]
    fn test_out_of_range_moves_are_noops() {
        let flag = flag_with_rules(FlagValueType::Boolean, vec![]);
        let mut editor = RuleEditor::load(&flag);
        editor.add_rule();

        assert!(!editor.move_up(0));
        assert!(!editor.move_down(0));
        assert!(!editor.move_up(5));
        assert!(!editor.move_down(5));
        assert_eq!(editor.rules().len(), 1);
    }

    #[test]
    fn test_removing_the_last_rule_is_allowed() {
        let flag = flag_with_rules(
            FlagValueType::Boolean,
            vec![server_rule(None, 100, json!(true))],
        );
        let mut editor = RuleEditor::load(&flag);

        let local_id = editor.rules()[0].local_id;
        assert!(editor.remove_rule(local_id));
        assert!(editor.rules().is_empty());
        assert!(editor.is_dirty());
        assert!(editor.to_inputs().is_empty());

        assert!(!editor.remove_rule(local_id));
    }

    #[test]
    fn test_rollout_is_clamped_on_edit_and_save() {
        let flag = flag_with_rules(FlagValueType::Boolean, vec![]);
        let mut editor = RuleEditor::load(&flag);
        let id = editor.add_rule();

        editor.set_rollout(id, 250);
        assert_eq!(editor.rules()[0].rollout_percentage, 100);
        editor.set_rollout(id, -5);
        assert_eq!(editor.rules()[0].rollout_percentage, 0);

        // Even a hand-built out-of-range draft is clamped at the wire.
        let mut cloned = editor.clone();
        cloned.rules[0].rollout_percentage = 999;
        assert_eq!(cloned.to_inputs()[0].rollout_percentage, 100);
    }

    #[test]
    fn test_edit_by_unknown_local_id_is_a_noop() {
        let flag = flag_with_rules(FlagValueType::Boolean, vec![]);
        let mut editor = RuleEditor::load(&flag);
        editor.add_rule();

        assert!(!editor.set_rollout(999, 10));
        assert!(!editor.set_segment(999, Some(Uuid::new_v4())));
        assert_eq!(editor.rules()[0].rollout_percentage, 100);
    }

    #[test]
    fn test_local_ids_are_stable_across_reorders() {
        let flag = flag_with_rules(FlagValueType::String, vec![]);
        let mut editor = RuleEditor::load(&flag);

        let a = editor.add_rule();
        let b = editor.add_rule();
        editor.move_down(0);

        // `a` still addresses the same rule after the swap.
        editor.set_value(a, json!("for-a"));
        let by_id: Vec<(u64, Value)> = editor
            .rules()
            .iter()
            .map(|r| (r.local_id, r.value.clone()))
            .collect();
        assert_eq!(by_id, vec![(b, json!("")), (a, json!("for-a"))]);
    }
}
