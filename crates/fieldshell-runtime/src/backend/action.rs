//! Step action lookup tables.
//!
//! `{namespace, action}` pairs resolve to a closed [`StepAction`] sum
//! type through one table per namespace. Anything not in a table is
//! [`BackendError::UnknownAction`].

use super::BackendError;
use crate::protocol::Namespace;

macro_rules! action_table {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every action in this namespace.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            #[must_use]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }
    };
}

action_table!(
    /// Local, deterministic field-state actions.
    FieldAction {
        Initialize => "initialize",
        StabilizeCoherence => "stabilize_coherence",
        AnalyzeAttractors => "analyze_attractors",
        MaximizeCoherence => "maximize_coherence",
        ActivateDimension => "activate_dimension",
    }
);

action_table!(
    /// Recursive analysis through the cognitive collaborator.
    RecursiveAction {
        Analyze => "analyze",
        Refine => "refine",
    }
);

action_table!(
    /// Reasoning through the cognitive collaborator.
    CognitiveAction {
        Reason => "reason",
        ExtractPatterns => "extract_patterns",
        GenerateInsight => "generate_insight",
    }
);

action_table!(
    /// Pure computation over the execution context.
    EmergenceAction {
        DetectPatterns => "detect_patterns",
        FilterPatterns => "filter_patterns",
        Validate => "validate",
    }
);

action_table!(
    /// Numeric work through the compute collaborator.
    BraunAction {
        Optimize => "optimize",
        Compute => "compute",
    }
);

action_table!(
    /// Named functions on the transcendent collaborator.
    BeyondAction {
        TranscendContext => "transcend_context",
        SynthesizeKnowledge => "synthesize_knowledge",
        ValidateEmergence => "validate_emergence",
    }
);

/// A resolved step action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepAction {
    Field(FieldAction),
    Recursive(RecursiveAction),
    Cognitive(CognitiveAction),
    Emergence(EmergenceAction),
    Braun(BraunAction),
    Beyond(BeyondAction),
}

impl StepAction {
    /// Looks `action` up in `namespace`'s table.
    ///
    /// # Errors
    ///
    /// [`BackendError::UnknownAction`] if the table has no such entry.
    pub fn resolve(namespace: Namespace, action: &str) -> Result<Self, BackendError> {
        let resolved = match namespace {
            Namespace::Field => FieldAction::from_name(action).map(Self::Field),
            Namespace::Recursive => RecursiveAction::from_name(action).map(Self::Recursive),
            Namespace::Cognitive => CognitiveAction::from_name(action).map(Self::Cognitive),
            Namespace::Emergence => EmergenceAction::from_name(action).map(Self::Emergence),
            Namespace::Braun => BraunAction::from_name(action).map(Self::Braun),
            Namespace::Beyond => BeyondAction::from_name(action).map(Self::Beyond),
        };
        resolved.ok_or_else(|| BackendError::UnknownAction {
            namespace,
            action: action.to_string(),
        })
    }

    #[must_use]
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::Field(_) => Namespace::Field,
            Self::Recursive(_) => Namespace::Recursive,
            Self::Cognitive(_) => Namespace::Cognitive,
            Self::Emergence(_) => Namespace::Emergence,
            Self::Braun(_) => Namespace::Braun,
            Self::Beyond(_) => Namespace::Beyond,
        }
    }

    #[must_use]
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::Field(a) => a.name(),
            Self::Recursive(a) => a.name(),
            Self::Cognitive(a) => a.name(),
            Self::Emergence(a) => a.name(),
            Self::Braun(a) => a.name(),
            Self::Beyond(a) => a.name(),
        }
    }
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace(), self.action_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_actions() {
        assert_eq!(
            StepAction::resolve(Namespace::Field, "maximize_coherence").unwrap(),
            StepAction::Field(FieldAction::MaximizeCoherence)
        );
        assert_eq!(
            StepAction::resolve(Namespace::Beyond, "validate_emergence")
                .unwrap()
                .to_string(),
            "beyond.validate_emergence"
        );
    }

    #[test]
    fn tables_are_namespace_scoped() {
        // `analyze` exists under recursive, not under field
        assert!(StepAction::resolve(Namespace::Recursive, "analyze").is_ok());
        let err = StepAction::resolve(Namespace::Field, "analyze").unwrap_err();
        assert!(matches!(err, BackendError::UnknownAction { namespace: Namespace::Field, .. }));
    }

    #[test]
    fn names_roundtrip_through_tables() {
        for action in FieldAction::ALL {
            assert_eq!(FieldAction::from_name(action.name()), Some(*action));
        }
        for action in BeyondAction::ALL {
            assert_eq!(BeyondAction::from_name(action.name()), Some(*action));
        }
        assert_eq!(EmergenceAction::ALL.len(), 3);
    }
}
