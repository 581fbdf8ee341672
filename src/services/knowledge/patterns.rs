// Built-in dark pattern table
// Keyword regexes, semantic indicators and canonical examples per category

use super::RuleDefinition;
use crate::models::PatternSeverity;

fn rule(
    pattern_type: &str,
    display_name: &str,
    description: &str,
    severity: PatternSeverity,
    keywords: &[&str],
    semantic_indicators: &[&str],
    examples: &[&str],
) -> RuleDefinition {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    RuleDefinition {
        pattern_type: pattern_type.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        severity,
        keywords: owned(keywords),
        literal: false,
        semantic_indicators: owned(semantic_indicators),
        examples: owned(examples),
    }
}

/// Rules in evaluation order.
pub fn builtin_definitions() -> Vec<RuleDefinition> {
    vec![
        rule(
            "urgency",
            "Urgency/Scarcity",
            "Creates false or exaggerated sense of urgency to pressure users into quick decisions",
            PatternSeverity::Medium,
            &[
                r"only \d+ left",
                r"hurry",
                r"limited time",
                r"expires soon",
                r"ending soon",
                r"last chance",
                r"almost gone",
                r"selling fast",
                r"while supplies last",
                r"limited stock",
                r"flash sale",
                r"today only",
                r"act now",
                r"don't miss out",
                r"\d+ people (are )?viewing",
                r"almost sold out",
                r"going fast",
            ],
            &[
                "Time pressure language",
                "Limited availability claims",
                "Countdown timers",
                "Stock scarcity warnings",
                "Expiration threats",
                "Now-or-never messaging",
            ],
            &[
                "Only 2 left in stock!",
                "Sale ends in 3 hours",
                "Limited time offer",
                "Almost gone",
                "Act now before it's too late",
                "This deal won't last",
                "Hurry, selling fast",
            ],
        ),
        rule(
            "confirmshaming",
            "Confirmshaming",
            "Uses guilt, shame, or negative emotions to manipulate users who decline an offer",
            PatternSeverity::High,
            &[
                r"no thanks, i don't want",
                r"no, i'll pay full price",
                r"no, i don't want to save",
                r"no thanks, i hate",
                r"i don't want to",
                r"continue without",
                r"skip this (great|amazing)",
            ],
            &[
                "Guilt-inducing decline options",
                "Shame-based language",
                "Negative self-description in opt-out",
                "Emotional manipulation",
                "Implied personal failure",
            ],
            &[
                "No thanks, I don't want to save money",
                "No, I prefer paying full price",
                "No thanks, I hate discounts",
                "Continue without protection",
                "No, I don't care about my privacy",
                "Skip and remain vulnerable",
            ],
        ),
        rule(
            "forcedContinuity",
            "Forced Continuity",
            "Makes it easy to sign up but difficult to cancel subscriptions or services",
            PatternSeverity::High,
            &[
                r"free trial.*cancel",
                r"cancel anytime",
                r"no commitment.*automatic",
                r"start.*free trial",
                r"first.*free",
                r"automatic renewal",
            ],
            &[
                "Easy signup, hard cancel",
                "Free trial that auto-renews",
                "Hidden cancellation process",
                "Subscription without clear exit",
                "Automatic renewal without notice",
            ],
            &[
                "Free trial, cancel anytime (but process is hidden)",
                "Automatic renewal after trial",
                "No commitment (but hard to find cancel)",
                "Start your free trial (charges automatically)",
                "Try free for 7 days",
            ],
        ),
        rule(
            "hiddenCosts",
            "Hidden Costs",
            "Conceals additional fees, charges, or costs until late in the purchase process",
            PatternSeverity::High,
            &[
                r"additional fees may apply",
                r"plus tax",
                r"exclud(e|ing) shipping",
                r"handling fee",
                r"service charge",
                r"processing fee",
                r"convenience fee",
                r"fees? (not )?includ",
            ],
            &[
                "Surprise fees at checkout",
                "Undisclosed additional charges",
                "Hidden shipping costs",
                "Service fees revealed late",
                "Tax not included in price",
            ],
            &[
                "Plus tax and shipping",
                "Additional fees may apply",
                "Excluding handling fees",
                "Service charge not included",
                "Processing fee added at checkout",
                "Convenience fee applies",
            ],
        ),
        rule(
            "misdirection",
            "Misdirection",
            "Draws attention to one thing to distract from another, often using visual tricks",
            PatternSeverity::Medium,
            &[
                r"agree to all",
                r"accept all",
                r"allow all",
                r"i agree to (the )?terms",
                r"i accept",
            ],
            &[
                "Prominent accept/allow buttons",
                "Hidden decline options",
                "Visual emphasis on one choice",
                "Deceptive button placement",
                "Confusing visual hierarchy",
            ],
            &[
                "Accept all (big button) vs Manage preferences (tiny link)",
                "Allow all cookies (highlighted) vs Necessary only (grayed out)",
                "Agree (green, large) vs Decline (gray, small)",
                "Subscribe (prominent) vs No thanks (barely visible)",
            ],
        ),
        rule(
            "trickQuestions",
            "Trick Questions",
            "Uses confusing or double-negative wording to trick users into unintended choices",
            PatternSeverity::High,
            &[
                r"uncheck to opt out",
                r"check to not receive",
                r"disable to enable",
                r"opt out of.*not",
                r"do not.*to receive",
            ],
            &[
                "Double negatives",
                "Confusing checkbox wording",
                "Reverse logic",
                "Ambiguous phrasing",
                "Contradictory instructions",
            ],
            &[
                "Uncheck to opt out",
                "Check here to NOT receive emails",
                "Disable to enable notifications",
                "Click to stop not receiving updates",
                "Opt out of unsubscribing",
            ],
        ),
        rule(
            "sneaking",
            "Sneaking",
            "Hides, disguises, or delays revealing information until user is committed",
            PatternSeverity::High,
            &[
                r"pre.*select",
                r"default.*check",
                r"automatically.*add",
                r"included.*purchase",
                r"added to (your )?cart",
            ],
            &[
                "Pre-checked boxes for extras",
                "Hidden items added to cart",
                "Bundled unwanted items",
                "Auto-enrollment in programs",
                "Unexpected additions",
            ],
            &[
                "Pre-checked: Add insurance ($15)",
                "Newsletter subscription (checked by default)",
                "Marketing consent (pre-selected)",
                "Sign up for premium (auto-selected)",
            ],
        ),
        rule(
            "socialProof",
            "Social Proof (Fabricated)",
            "Uses potentially fake or misleading social proof to influence decisions",
            PatternSeverity::Low,
            &[
                r"\d+ (customers?|people) (purchased|bought|viewing)",
                r"bestseller",
                r"most popular",
                r"#1 choice",
                r"customer favorite",
                r"trending( now)?",
                r"highly rated",
                r"\d+ reviews?",
            ],
            &[
                "Suspicious popularity claims",
                "Vague customer numbers",
                "Unverified testimonials",
                "Generic review counts",
                "Manufactured trends",
            ],
            &[
                "10,000 people are viewing this",
                "Most popular choice",
                "Bestseller (without proof)",
                "Trending now",
                "Customer favorite",
                "Highly rated (no rating shown)",
            ],
        ),
        rule(
            "baitAndSwitch",
            "Bait and Switch",
            "Advertises one thing but delivers another, or shows fake prices/discounts",
            PatternSeverity::Medium,
            &[
                r"was \$\d+",
                r"originally \$\d+",
                r"save \d+%",
                r"regular price",
                r"sale price",
                r"now only",
                r"msrp",
            ],
            &[
                "Fake original prices",
                "Misleading discounts",
                "Inflated regular prices",
                "Different product delivered",
                "False savings claims",
            ],
            &[
                "Was $199, now $99 (never was $199)",
                "Originally $500 (fabricated price)",
                "Save 70% (inflated base price)",
                "Regular price $X (never sold at that price)",
            ],
        ),
        rule(
            "obstruction",
            "Obstruction",
            "Makes desired user actions difficult or impossible to complete",
            PatternSeverity::High,
            &[
                r"call (us )?to cancel",
                r"contact.*customer service.*delete",
                r"write to.*unsubscribe",
                r"no online.*cancel",
            ],
            &[
                "Hard-to-find settings",
                "Multiple steps to cancel",
                "Disabled options without reason",
                "Broken unsubscribe links",
                "Convoluted processes",
            ],
            &[
                "Call to cancel (no online option)",
                "Contact customer service to unsubscribe",
                "Account deletion requires phone call",
                "Privacy settings buried in menus",
            ],
        ),
        rule(
            "nagging",
            "Nagging",
            "Repeatedly interrupts or pesters users to take unwanted actions",
            PatternSeverity::Medium,
            &[
                r"ask (me )?later",
                r"remind me",
                r"not now",
                r"maybe later",
                r"ask again",
            ],
            &[
                "Repeated popup requests",
                "Persistent notifications",
                "Multiple asks for same action",
                "Won't take no for answer",
                "Constant reminders",
            ],
            &[
                "Enable notifications (asked repeatedly)",
                "Rate our app (every time you open)",
                "Subscribe to newsletter (shown every visit)",
                "Allow location (asked on every page)",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_rule_compiles() {
        for def in builtin_definitions() {
            assert!(def.compile().is_ok(), "rule {} failed to compile", def.pattern_type);
        }
    }

    #[test]
    fn test_types_are_unique_and_non_empty() {
        let defs = builtin_definitions();
        let types: HashSet<_> = defs.iter().map(|d| d.pattern_type.clone()).collect();
        assert_eq!(types.len(), defs.len());
        assert!(defs.iter().all(|d| !d.keywords.is_empty() && !d.examples.is_empty()));
    }
}
