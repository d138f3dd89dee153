//! Schema registry
//!
//! The closed set of fragment schemas the engine recognizes. Classifier
//! descriptors naming anything outside this registry are dropped at the
//! fragment builder; nothing unknown is ever stored or exported.
//!
//! Each schema carries a display name and a one-line extraction
//! instruction; the prompt builder renders both into the classifier's
//! system context.

use serde::{Deserialize, Serialize};

/// Identifier of a fragment schema.
///
/// Serializes to the exact wire name used in classifier responses and in
/// the exported fragment records (e.g. `"Causal Relation"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaId {
    Definition,
    Comparison,
    #[serde(rename = "Causal Relation")]
    CausalRelation,
    #[serde(rename = "Application Context")]
    ApplicationContext,
    Example,
    #[serde(rename = "Architectural Component")]
    ArchitecturalComponent,
    #[serde(rename = "Technical Process")]
    TechnicalProcess,
    Algorithm,
    #[serde(rename = "Conceptual Model")]
    ConceptualModel,
    Principle,
    #[serde(rename = "Problem Solution")]
    ProblemSolution,
    #[serde(rename = "Limitations And Challenges")]
    LimitationsAndChallenges,
    Functionality,
    Capabilities,
    #[serde(rename = "System Integration")]
    SystemIntegration,
    #[serde(rename = "Component Interaction")]
    ComponentInteraction,
    #[serde(rename = "Use Case")]
    UseCase,
    #[serde(rename = "Concept Implementation")]
    ConceptImplementation,
    #[serde(rename = "Code Snippet")]
    CodeSnippet,
    Enumeration,
    #[serde(rename = "Table Analysis")]
    TableAnalysis,
    #[serde(rename = "Advantage Disadvantage")]
    AdvantageDisadvantage,
}

impl SchemaId {
    /// Every registered schema, in registry order.
    pub const ALL: [SchemaId; 22] = [
        SchemaId::Definition,
        SchemaId::Comparison,
        SchemaId::CausalRelation,
        SchemaId::ApplicationContext,
        SchemaId::Example,
        SchemaId::ArchitecturalComponent,
        SchemaId::TechnicalProcess,
        SchemaId::Algorithm,
        SchemaId::ConceptualModel,
        SchemaId::Principle,
        SchemaId::ProblemSolution,
        SchemaId::LimitationsAndChallenges,
        SchemaId::Functionality,
        SchemaId::Capabilities,
        SchemaId::SystemIntegration,
        SchemaId::ComponentInteraction,
        SchemaId::UseCase,
        SchemaId::ConceptImplementation,
        SchemaId::CodeSnippet,
        SchemaId::Enumeration,
        SchemaId::TableAnalysis,
        SchemaId::AdvantageDisadvantage,
    ];

    /// Schemas active when neither config nor CLI names a set.
    /// `Comparison` is registered but stays opt-in.
    pub const DEFAULT_ACTIVE: [SchemaId; 21] = [
        SchemaId::Definition,
        SchemaId::CausalRelation,
        SchemaId::ApplicationContext,
        SchemaId::Example,
        SchemaId::ArchitecturalComponent,
        SchemaId::TechnicalProcess,
        SchemaId::Algorithm,
        SchemaId::ConceptualModel,
        SchemaId::Principle,
        SchemaId::ProblemSolution,
        SchemaId::LimitationsAndChallenges,
        SchemaId::Functionality,
        SchemaId::Capabilities,
        SchemaId::SystemIntegration,
        SchemaId::ComponentInteraction,
        SchemaId::UseCase,
        SchemaId::ConceptImplementation,
        SchemaId::CodeSnippet,
        SchemaId::Enumeration,
        SchemaId::TableAnalysis,
        SchemaId::AdvantageDisadvantage,
    ];

    /// The wire name, as it appears in classifier output and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaId::Definition => "Definition",
            SchemaId::Comparison => "Comparison",
            SchemaId::CausalRelation => "Causal Relation",
            SchemaId::ApplicationContext => "Application Context",
            SchemaId::Example => "Example",
            SchemaId::ArchitecturalComponent => "Architectural Component",
            SchemaId::TechnicalProcess => "Technical Process",
            SchemaId::Algorithm => "Algorithm",
            SchemaId::ConceptualModel => "Conceptual Model",
            SchemaId::Principle => "Principle",
            SchemaId::ProblemSolution => "Problem Solution",
            SchemaId::LimitationsAndChallenges => "Limitations And Challenges",
            SchemaId::Functionality => "Functionality",
            SchemaId::Capabilities => "Capabilities",
            SchemaId::SystemIntegration => "System Integration",
            SchemaId::ComponentInteraction => "Component Interaction",
            SchemaId::UseCase => "Use Case",
            SchemaId::ConceptImplementation => "Concept Implementation",
            SchemaId::CodeSnippet => "Code Snippet",
            SchemaId::Enumeration => "Enumeration",
            SchemaId::TableAnalysis => "Table Analysis",
            SchemaId::AdvantageDisadvantage => "Advantage Disadvantage",
        }
    }

    /// Look up a schema by its wire name. Unknown names are not schemas.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }

    /// Human-readable label for listings.
    pub fn display_name(&self) -> &'static str {
        match self {
            SchemaId::Definition => "Definition",
            SchemaId::Comparison => "Comparison",
            SchemaId::CausalRelation => "Causal relationship",
            SchemaId::ApplicationContext => "Application context",
            SchemaId::Example => "Example",
            SchemaId::ArchitecturalComponent => "Architectural component",
            SchemaId::TechnicalProcess => "Technical process",
            SchemaId::Algorithm => "Algorithm / method",
            SchemaId::ConceptualModel => "Conceptual model",
            SchemaId::Principle => "Principle / approach",
            SchemaId::ProblemSolution => "Problem and solution",
            SchemaId::LimitationsAndChallenges => "Limitations and challenges",
            SchemaId::Functionality => "Functionality",
            SchemaId::Capabilities => "Capabilities",
            SchemaId::SystemIntegration => "System integration",
            SchemaId::ComponentInteraction => "Component interaction",
            SchemaId::UseCase => "Use case",
            SchemaId::ConceptImplementation => "Concept implementation",
            SchemaId::CodeSnippet => "Code snippet",
            SchemaId::Enumeration => "Enumeration / list",
            SchemaId::TableAnalysis => "Table / matrix",
            SchemaId::AdvantageDisadvantage => "Advantages and disadvantages",
        }
    }

    /// One-line extraction instruction rendered into the system prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            SchemaId::Definition => {
                "Extract from the definition: term (the defined term), includes (terms mentioned in the definition)."
            }
            SchemaId::Comparison => {
                "Extract from the comparison: target (main object), comparator (what it is compared against), criterion (comparison criteria), advantage (who wins each criterion)."
            }
            SchemaId::CausalRelation => {
                "Extract causal links: cause (causes, influencing factors), effect (consequences, results)."
            }
            SchemaId::ApplicationContext => {
                "Extract the application context: domain (areas where it applies)."
            }
            SchemaId::Example => {
                "Extract from the example: illustrates (what it illustrates), type (code/scenario/analogy/counter-example)."
            }
            SchemaId::ArchitecturalComponent => {
                "Extract the system component: system_terms (owning system), purpose_terms (purpose), interfaces_terms (what it interacts with), pattern_terms (architectural patterns)."
            }
            SchemaId::TechnicalProcess => {
                "Extract the technical process: input_types, output_types, process_category, involves_components."
            }
            SchemaId::Algorithm => {
                "Extract the algorithm: input_types, output_types (results), involves_components (concepts used), process_category (kind of algorithm)."
            }
            SchemaId::ConceptualModel => {
                "Extract the conceptual model: target (central concept), involves_components (related concepts)."
            }
            SchemaId::Principle => {
                "Extract the principle: target (principle/approach), domain (where it applies), comparator (what it contrasts with), demonstrates (what it provides)."
            }
            SchemaId::ProblemSolution => {
                "Extract the problem and its solution: problem_domain, solution_components."
            }
            SchemaId::LimitationsAndChallenges => {
                "Extract the limitations: target (what they apply to), problem_domain (kind of limitation or problem)."
            }
            SchemaId::Functionality => {
                "Extract the functionality: system_terms (system or component), purpose_terms (functions), involves_components (dependencies)."
            }
            SchemaId::Capabilities => {
                "Extract the capabilities: target (what has them), purpose_terms (capability kinds), demonstrates (scenarios enabled)."
            }
            SchemaId::SystemIntegration => {
                "Extract the integration: target (primary system), comparator (integrated system), interfaces_terms (integration points), process_category (integration method)."
            }
            SchemaId::ComponentInteraction => {
                "Extract the interaction: target (initiator), comparator (interaction target), process_category (interaction kind), involves_components (intermediaries)."
            }
            SchemaId::UseCase => {
                "Extract the scenario: domain (subject area), actors (participants), demonstrates (what it demonstrates)."
            }
            SchemaId::ConceptImplementation => {
                "Extract the implementation: concept_ref (implemented concept), technologies (technologies used), key_features."
            }
            SchemaId::CodeSnippet => {
                "Extract only if the fragment contains actual code/script/grammar: language, illustrates, input_types, output_types, keywords."
            }
            SchemaId::Enumeration => {
                "Extract only if the fragment is a clear list or enumeration: category (list topic), items (elements as terms), keywords."
            }
            SchemaId::TableAnalysis => {
                "Extract only if the fragment contains a structured table/matrix: rows, columns, values (cell values), keywords."
            }
            SchemaId::AdvantageDisadvantage => {
                "Extract only if the fragment clearly lists pros/cons: target (analyzed object), advantages, disadvantages, keywords."
            }
        }
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a list of wire names into an active schema set, preserving order.
///
/// Unknown names are warned about and dropped; duplicates collapse to the
/// first occurrence.
pub fn parse_active_set(names: &[String]) -> Vec<SchemaId> {
    let mut active = Vec::new();
    for name in names {
        match SchemaId::parse(name) {
            Some(schema) => {
                if !active.contains(&schema) {
                    active.push(schema);
                }
            }
            None => tracing::warn!("unknown schema '{}' ignored", name),
        }
    }
    active
}
