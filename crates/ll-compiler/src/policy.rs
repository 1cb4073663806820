//! Mode policy: how each filtering mode transforms the base domain rules.

use ll_core::{DomainToken, Mode, ResourceType, Rule, RuleCondition};

use crate::rules::RuleCompiler;

/// Resource types blocked wholesale in extreme mode, in ID order.
pub const EXTREME_RESOURCE_TYPES: [ResourceType; 3] =
    [ResourceType::Image, ResourceType::Media, ResourceType::Font];

/// Transform compiled domain rules for `mode`.
///
/// Extreme mode appends one rule per [`EXTREME_RESOURCE_TYPES`] entry with
/// IDs directly above the highest domain rule ID (or 1, 2, 3 when there are
/// no domain rules).
pub fn apply_mode_policy(mode: Mode, base_rules: Vec<Rule>) -> Vec<Rule> {
    match mode {
        Mode::Off => Vec::new(),
        Mode::Low | Mode::Medium | Mode::High => base_rules,
        Mode::Extreme => {
            let max_id = base_rules.iter().map(|rule| rule.id).max().unwrap_or(0);
            let mut rules = base_rules;
            rules.extend(
                EXTREME_RESOURCE_TYPES
                    .iter()
                    .zip(1..)
                    .filter_map(|(&ty, offset)| {
                        let id = max_id.checked_add(offset);
                        if id.is_none() {
                            log::warn!("no rule ID left above {} for {:?} rule", max_id, ty);
                        }
                        id.map(|id| resource_type_rule(id, ty))
                    }),
            );
            rules
        }
    }
}

fn resource_type_rule(id: u32, ty: ResourceType) -> Rule {
    Rule::block(
        id,
        RuleCondition {
            url_filter: None,
            resource_types: Some(vec![ty]),
        },
    )
}

impl RuleCompiler {
    /// The full rule set for `mode`. Off never looks at `domains`.
    pub fn compile_for_mode(&self, mode: Mode, domains: &[DomainToken]) -> Vec<Rule> {
        if !mode.uses_filter_list() {
            return Vec::new();
        }
        apply_mode_policy(mode, self.compile_domain_rules(domains))
    }
}

/// Compile for `mode` with the default compiler limits.
pub fn compile_for_mode(mode: Mode, domains: &[DomainToken]) -> Vec<Rule> {
    RuleCompiler::default().compile_for_mode(mode, domains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::compile_domain_rules;

    fn domains(count: usize) -> Vec<DomainToken> {
        (0..count)
            .map(|i| DomainToken::new(format!("host{}.test", i)).unwrap())
            .collect()
    }

    fn ids(rules: &[Rule]) -> Vec<u32> {
        rules.iter().map(|r| r.id).collect()
    }

    #[test]
    fn off_is_always_empty() {
        assert!(compile_for_mode(Mode::Off, &[]).is_empty());
        assert!(compile_for_mode(Mode::Off, &domains(10)).is_empty());
    }

    #[test]
    fn low_medium_high_share_base_rules() {
        let input = domains(4);
        let base = compile_domain_rules(&input);
        for mode in [Mode::Low, Mode::Medium, Mode::High] {
            assert_eq!(compile_for_mode(mode, &input), base, "mode {}", mode);
        }
    }

    #[test]
    fn extreme_without_domains_uses_ids_one_to_three() {
        let rules = compile_for_mode(Mode::Extreme, &[]);
        assert_eq!(ids(&rules), vec![1, 2, 3]);
    }

    #[test]
    fn extreme_appends_after_highest_domain_id() {
        let rules = compile_for_mode(Mode::Extreme, &domains(5));
        assert_eq!(rules.len(), 8);
        assert_eq!(ids(&rules[5..]), vec![105, 106, 107]);
    }

    #[test]
    fn extreme_rules_block_image_media_font_in_order() {
        let rules = compile_for_mode(Mode::Extreme, &domains(2));
        let extra: Vec<_> = rules[2..]
            .iter()
            .map(|r| {
                assert_eq!(r.priority, 1);
                assert!(r.condition.url_filter.is_none());
                r.condition.resource_types.clone().unwrap()
            })
            .collect();
        assert_eq!(
            extra,
            vec![
                vec![ResourceType::Image],
                vec![ResourceType::Media],
                vec![ResourceType::Font]
            ]
        );
    }

    #[test]
    fn extreme_ids_stay_unique_with_custom_base() {
        let compiler = RuleCompiler {
            max_domain_rules: 3,
            base_id: 7,
        };
        let rules = compiler.compile_for_mode(Mode::Extreme, &domains(10));
        assert_eq!(ids(&rules), vec![7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn policy_uses_max_id_not_last_id() {
        let mut base = compile_domain_rules(&domains(3));
        base.reverse();
        let rules = apply_mode_policy(Mode::Extreme, base);
        assert_eq!(ids(&rules[3..]), vec![103, 104, 105]);
    }

    #[test]
    fn extreme_near_last_rule_id_never_wraps() {
        let compiler = RuleCompiler {
            max_domain_rules: 10,
            base_id: u32::MAX - 1,
        };
        let rules = compiler.compile_for_mode(Mode::Extreme, &domains(3));
        assert_eq!(ids(&rules), vec![u32::MAX - 1, u32::MAX]);

        let compiler = RuleCompiler {
            max_domain_rules: 2,
            base_id: u32::MAX - 4,
        };
        let rules = compiler.compile_for_mode(Mode::Extreme, &domains(2));
        assert_eq!(
            ids(&rules),
            vec![u32::MAX - 4, u32::MAX - 3, u32::MAX - 2, u32::MAX - 1, u32::MAX]
        );
    }

    #[test]
    fn extreme_stays_under_host_quota() {
        let rules = compile_for_mode(Mode::Extreme, &domains(6000));
        assert_eq!(rules.len(), 4993);
        assert!(rules.len() <= 5000);
    }
}
