//! Built-in protocol shells.
//!
//! | Name | Steps |
//! |------|-------|
//! | `field_initialization` | `field.initialize`, `field.analyze_attractors` |
//! | `recursive_analysis` | `recursive.analyze`, `recursive.refine` (low confidence only) |
//! | `emergence_detection` | `field.analyze_attractors`, `emergence.detect_patterns`, `emergence.filter_patterns`, `emergence.validate` |
//! | `coherence_optimization` | `field.stabilize_coherence`, `field.maximize_coherence` (opt-in), `braun.optimize` (async) |
//! | `transcendent_synthesis` | `cognitive.reason`, `beyond.transcend_context`, `beyond.synthesize_knowledge`, `field.activate_dimension` (on emergence) |

use super::{Complexity, Condition, Namespace, Operator, ProtocolShell, Step};
use crate::schema::TypeSchema;
use serde_json::json;

/// Every built-in shell.
#[must_use]
pub fn all() -> Vec<ProtocolShell> {
    vec![
        field_initialization(),
        recursive_analysis(),
        emergence_detection(),
        coherence_optimization(),
        transcendent_synthesis(),
    ]
}

#[must_use]
pub fn field_initialization() -> ProtocolShell {
    ProtocolShell::new("field_initialization", "Reset a field and derive its attractors")
        .input("energy", TypeSchema::number().min(0.0))
        .input("coherence", TypeSchema::number().range(0.0, 1.0))
        .step(Step::new(Namespace::Field, "initialize"))
        .step(Step::new(Namespace::Field, "analyze_attractors"))
        .output("energy", TypeSchema::number())
        .output("coherence", TypeSchema::number())
        .output("attractors", TypeSchema::any_array())
        .complexity(Complexity::Low)
        .reliability(0.99)
        .performance("local")
}

#[must_use]
pub fn recursive_analysis() -> ProtocolShell {
    ProtocolShell::new("recursive_analysis", "Analyze a query recursively, refining weak answers")
        .input("query", TypeSchema::string().required().describe("question to analyze"))
        .input("depth", TypeSchema::number().range(1.0, 10.0))
        .step(Step::new(Namespace::Recursive, "analyze"))
        .step(
            Step::new(Namespace::Recursive, "refine").when(Condition::new(
                "results.recursive.analyze.confidence",
                Operator::Less,
                json!(0.9),
            )),
        )
        .output("analysis", TypeSchema::string())
        .output("confidence", TypeSchema::number())
        .output("source", TypeSchema::string())
        .complexity(Complexity::Medium)
        .reliability(0.9)
        .performance("collaborator")
}

#[must_use]
pub fn emergence_detection() -> ProtocolShell {
    let detected = || {
        Condition::new(
            "results.emergence.detect_patterns.emergenceDetected",
            Operator::Equals,
            json!(true),
        )
    };

    ProtocolShell::new("emergence_detection", "Detect and validate emergent patterns")
        .input("threshold", TypeSchema::number().range(0.0, 1.0))
        .step(Step::new(Namespace::Field, "analyze_attractors"))
        .step(Step::new(Namespace::Emergence, "detect_patterns"))
        .step(Step::new(Namespace::Emergence, "filter_patterns").when(detected()))
        .step(Step::new(Namespace::Emergence, "validate").when(detected()))
        .output("emergenceDetected", TypeSchema::boolean())
        .output("patterns", TypeSchema::any_array())
        .output("validated", TypeSchema::boolean())
        .complexity(Complexity::High)
        .reliability(0.85)
        .performance("local")
}

#[must_use]
pub fn coherence_optimization() -> ProtocolShell {
    ProtocolShell::new("coherence_optimization", "Raise field coherence toward a target")
        .input("target", TypeSchema::number().range(0.0, 1.0))
        .input("maximize", TypeSchema::boolean())
        .step(Step::new(Namespace::Field, "stabilize_coherence"))
        .step(
            Step::new(Namespace::Field, "maximize_coherence").when(Condition::new(
                "params.maximize",
                Operator::Equals,
                json!(true),
            )),
        )
        .step(
            Step::new(Namespace::Braun, "optimize")
                .param("task", json!("coherence_optimization"))
                .detached(),
        )
        .output("coherence", TypeSchema::number())
        .output("energy", TypeSchema::number())
        .complexity(Complexity::Medium)
        .reliability(0.95)
        .performance("mixed")
}

#[must_use]
pub fn transcendent_synthesis() -> ProtocolShell {
    ProtocolShell::new("transcendent_synthesis", "Synthesize knowledge beyond the current context")
        .input("context", TypeSchema::string().required())
        .input("sources", TypeSchema::array(TypeSchema::string()))
        .step(Step::new(Namespace::Cognitive, "reason"))
        .step(Step::new(Namespace::Beyond, "transcend_context"))
        .step(Step::new(Namespace::Beyond, "synthesize_knowledge"))
        .step(
            Step::new(Namespace::Field, "activate_dimension")
                .param("dimension", json!("transcendent"))
                .param("weight", json!(0.05))
                .when(
                    Condition::new(
                        "results.beyond.transcend_context.transcendenceLevel",
                        Operator::Emergence,
                        json!(null),
                    )
                    .threshold(0.8),
                ),
        )
        .output("synthesis", TypeSchema::string())
        .output("transcendenceLevel", TypeSchema::number())
        .output("insights", TypeSchema::any_array())
        .complexity(Complexity::Transcendent)
        .reliability(0.75)
        .performance("collaborator")
}
