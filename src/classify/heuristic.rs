//! Deterministic offline classifier
//!
//! Stands in for the remote model when running with `--mock`. Works in two
//! passes over each chunk: a structural pass over its Markdown (code
//! blocks, lists, tables) and a keyword pass over the remaining paragraph
//! blocks, plus line-level scans for definition lines and causal
//! sentences. The keyword banks carry the Russian and English lexemes the
//! corpus documents actually use. Same chunk + same active set always
//! yields the same descriptors.

use std::collections::HashSet;

use async_trait::async_trait;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::classify::prompt::SchemaContext;
use crate::classify::{ChunkClassification, Classifier, ClassifierError, FragmentDescriptor};
use crate::schema::SchemaId;
use crate::window::Window;

/// Lists longer than this are left to the paragraph pass.
const LIST_CHAR_LIMIT: usize = 2000;
/// Paragraph blocks shorter than this (trimmed) are noise.
const SHORT_BLOCK_CHARS: usize = 10;
/// Upper length for the colon-implies-definition fallback.
const COLON_DEFINITION_CHARS: usize = 300;

pub struct HeuristicClassifier {
    banks: Vec<(SchemaId, &'static str, Regex)>,
    pros_cons: Regex,
    code_markers: Regex,
    definition_line: Regex,
    causal_marker: Regex,
}

fn bank(schema: SchemaId, label: &'static str, pattern: &str) -> (SchemaId, &'static str, Regex) {
    (schema, label, Regex::new(pattern).expect("valid pattern"))
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        let banks = vec![
            bank(
                SchemaId::Definition,
                "definition",
                r"(?i)\bопределение\b|\bопределяется как\b|\bэто\b|\bis a\b|\brefers to\b",
            ),
            bank(
                SchemaId::Comparison,
                "comparison",
                r"(?i)\bв отличие от\b|\bпо сравнению\b|\bсравнива(?:ет|ются)\b|\bvs\b|\bпротив\b",
            ),
            bank(
                SchemaId::CausalRelation,
                "cause",
                r"(?i)\bприводит к\b|\bв результате\b|\bпотому что\b|\bобусловлен(?:о|а|ы)\b|\bdue to\b|\bresults? in\b",
            ),
            bank(
                SchemaId::ApplicationContext,
                "application",
                r"(?i)\bприменяется\b|\bиспользуется в\b|\bобласти применени|\bapplication context\b",
            ),
            bank(
                SchemaId::Example,
                "example",
                r"(?i)\bнапример\b|\bпример(?:ом)?\b|\be\.g\.|\bfor example\b",
            ),
            bank(
                SchemaId::ArchitecturalComponent,
                "arch_component",
                r"(?i)\bкомпонент\b|\bмодуль\b|\bдвижок\b|\bengine\b|\bконтроллер\b",
            ),
            bank(
                SchemaId::TechnicalProcess,
                "tech_process",
                r"(?i)\bвходн(?:ые|ых)\b|\bвыходн(?:ые|ых)\b|\bpipeline\b|\bпроцесс\b",
            ),
            bank(
                SchemaId::Algorithm,
                "algorithm",
                r"(?i)\bалгоритм\b|\bметод\b|\bшаг(?:и)?\b|\bprocedure\b",
            ),
            bank(
                SchemaId::ConceptualModel,
                "concept_model",
                r"(?i)\bконцептуальн(?:ая|ой) модель\b|\bмодель\b.*\bконцепт\b",
            ),
            bank(
                SchemaId::Principle,
                "principle",
                r"(?i)\bпринцип\b|\bподход\b|\bконтрастирует\b|\bобеспечивает\b",
            ),
            bank(
                SchemaId::ProblemSolution,
                "problem_solution",
                r"(?i)\bпроблем(?:а|ы)\b|\bрешени(?:е|я)\b|\bподход\b",
            ),
            bank(
                SchemaId::LimitationsAndChallenges,
                "limits",
                r"(?i)\bограничени(?:е|я)\b|\bвызов(?:ы)?\b|\bсложност(?:ь|и)\b",
            ),
            bank(
                SchemaId::Functionality,
                "functionality",
                r"(?i)\bфункциональност(?:ь|и)\b|\bфункци(?:я|и)\b",
            ),
            bank(
                SchemaId::Capabilities,
                "capabilities",
                r"(?i)\bвозможност(?:ь|и)\b|\bспособности\b",
            ),
            bank(
                SchemaId::SystemIntegration,
                "integration",
                r"(?i)\bинтеграци(?:я|и)\b|\bсовместимост(?:ь|и)\b|\bAPI\b",
            ),
            bank(
                SchemaId::ComponentInteraction,
                "component_interaction",
                r"(?i)\bвзаимодействи(?:е|я)\b|\bобмен\b|\bчерез\b",
            ),
            bank(
                SchemaId::UseCase,
                "use_case",
                r"(?i)\bсценари(?:й|я)\b|\bакто(?:р|ры)\b|\bпользователь\b|\bшаг(?:и)?\b",
            ),
            bank(
                SchemaId::ConceptImplementation,
                "concept_impl",
                r"(?i)\bреализаци(?:я|и)\b|\bтехнологи(?:я|и)\b|\bфреймворк\b|\bframework\b",
            ),
        ];

        Self {
            banks,
            pros_cons: Regex::new(
                r"(?i)\bпреимущест(?:ва|во)\b|\bнедостатк(?:и|ов)\b|\bплюсы\b|\bминусы\b|\bpros\b|\bcons\b|\badvantages?\b|\bdisadvantages?\b|\bbenefits\b|\bdrawbacks\b",
            )
            .expect("valid pattern"),
            code_markers: Regex::new(
                r"(?mi)```+|\{\}|\bclass\b|\bdef\b|;\s*$|\bpublic\b|\bvoid\b|\bfunction\b",
            )
            .expect("valid pattern"),
            definition_line: Regex::new(
                r"(?m)^(?P<head>[A-Za-zА-Яа-я0-9_ /\-]{3,50})\s*[—:\-]\s*(?P<body>.+)$",
            )
            .expect("valid pattern"),
            causal_marker: Regex::new(
                r"(?i)\b(?:because|due to|leads to|results in|causes|therefore|consequently|hence)\b",
            )
            .expect("valid pattern"),
        }
    }

    fn classify_chunk(&self, active: &[SchemaId], text: &str) -> Vec<FragmentDescriptor> {
        let mut descriptors = Vec::new();
        let claimed = self.structural_pass(active, text, &mut descriptors);
        self.paragraph_pass(active, text, &claimed, &mut descriptors);
        self.definition_lines(active, text, &mut descriptors);
        self.causal_sentences(active, text, &mut descriptors);
        descriptors
    }

    /// Markdown pass. Returns the byte ranges it claimed so the paragraph
    /// pass can stay off them.
    fn structural_pass(
        &self,
        active: &[SchemaId],
        text: &str,
        out: &mut Vec<FragmentDescriptor>,
    ) -> Vec<(usize, usize)> {
        let mut claimed = Vec::new();
        let mut list_depth = 0usize;
        let parser = Parser::new_ext(text, Options::ENABLE_TABLES);
        for (event, range) in parser.into_offset_iter() {
            match event {
                Event::Start(Tag::CodeBlock(_)) => {
                    claimed.push((range.start, range.end));
                    if active.contains(&SchemaId::CodeSnippet) {
                        out.push(descriptor(
                            text,
                            range.start,
                            range.end,
                            SchemaId::CodeSnippet,
                            0.95,
                            "fenced or indented code block",
                        ));
                    }
                }
                Event::Start(Tag::List(_)) => {
                    if list_depth == 0 && char_len(&text[range.clone()]) < LIST_CHAR_LIMIT {
                        claimed.push((range.start, range.end));
                        if active.contains(&SchemaId::Enumeration) {
                            out.push(descriptor(
                                text,
                                range.start,
                                range.end,
                                SchemaId::Enumeration,
                                0.85,
                                "bullet or numbered list",
                            ));
                        }
                    }
                    list_depth += 1;
                }
                Event::End(TagEnd::List(_)) => {
                    list_depth = list_depth.saturating_sub(1);
                }
                Event::Start(Tag::Table(_)) => {
                    claimed.push((range.start, range.end));
                    if active.contains(&SchemaId::TableAnalysis) {
                        out.push(descriptor(
                            text,
                            range.start,
                            range.end,
                            SchemaId::TableAnalysis,
                            0.8,
                            "table structure",
                        ));
                    }
                }
                _ => {}
            }
        }
        claimed
    }

    fn paragraph_pass(
        &self,
        active: &[SchemaId],
        text: &str,
        claimed: &[(usize, usize)],
        out: &mut Vec<FragmentDescriptor>,
    ) {
        for (start, end) in paragraph_blocks(text) {
            let overlaps_claimed = claimed
                .iter()
                .any(|&(c_start, c_end)| start < c_end && c_start < end);
            if overlaps_claimed {
                continue;
            }
            let block = &text[start..end];
            if block.trim().chars().count() < SHORT_BLOCK_CHARS {
                continue;
            }
            if let Some((schema, confidence, rationale)) = self.classify_block(block) {
                if active.contains(&schema) {
                    out.push(descriptor(text, start, end, schema, confidence, &rationale));
                }
            }
        }
    }

    /// Keyword cascade over one paragraph block. The banks are checked in
    /// a fixed order and the last matching bank wins; confidence grows
    /// with the number of matching banks.
    fn classify_block(&self, block: &str) -> Option<(SchemaId, f64, String)> {
        if self.looks_like_code(block) {
            return Some((SchemaId::CodeSnippet, 0.95, "code-like density".to_string()));
        }
        if self.pros_cons.is_match(block) {
            return Some((
                SchemaId::AdvantageDisadvantage,
                0.8,
                "pros/cons lexemes".to_string(),
            ));
        }

        let mut winner = None;
        let mut matched: Vec<&str> = Vec::new();
        for (schema, label, pattern) in &self.banks {
            if pattern.is_match(block) {
                winner = Some(*schema);
                matched.push(*label);
            }
        }
        if let Some(schema) = winner {
            let confidence = (0.6 + 0.1 * (matched.len() as f64 - 1.0)).min(0.9);
            let rationale = format!("keyword match: {}", matched.join(", "));
            return Some((schema, confidence, rationale));
        }

        if block.contains(':') && char_len(block) < COLON_DEFINITION_CHARS {
            return Some((
                SchemaId::Definition,
                0.5,
                "short block with defining colon".to_string(),
            ));
        }
        None
    }

    fn looks_like_code(&self, block: &str) -> bool {
        if self.code_markers.is_match(block) {
            return true;
        }
        let letters = block.chars().filter(|c| c.is_alphabetic()).count();
        let nonspace = block.chars().filter(|c| !c.is_whitespace()).count();
        nonspace > 0
            && (letters as f64) < 0.5 * nonspace as f64
            && block.contains(|c| c == '{' || c == ';' || c == '(')
    }

    /// `Term — body` / `Term: body` lines anywhere in the chunk.
    fn definition_lines(&self, active: &[SchemaId], text: &str, out: &mut Vec<FragmentDescriptor>) {
        if !active.contains(&SchemaId::Definition) {
            return;
        }
        for captures in self.definition_line.captures_iter(text) {
            let (Some(whole), Some(head)) = (captures.get(0), captures.name("head")) else {
                continue;
            };
            out.push(
                descriptor(
                    text,
                    whole.start(),
                    whole.end(),
                    SchemaId::Definition,
                    0.55,
                    "definition line",
                )
                .with_entity_refs(vec![head.as_str().trim().to_string()]),
            );
        }
    }

    /// Sentences carrying a causal marker. Each gets one causal span over
    /// the chunk text before the sentence, unless the sentence opens the
    /// chunk.
    fn causal_sentences(&self, active: &[SchemaId], text: &str, out: &mut Vec<FragmentDescriptor>) {
        if !active.contains(&SchemaId::CausalRelation) {
            return;
        }
        let mut seen = HashSet::new();
        for found in self.causal_marker.find_iter(text) {
            let (start, end) = sentence_bounds(text, found.start(), found.end());
            if !seen.insert((start, end)) {
                continue;
            }
            let start_char = char_offset(text, start);
            let mut built = descriptor(
                text,
                start,
                end,
                SchemaId::CausalRelation,
                0.5,
                "causal marker in sentence",
            );
            if start_char > 0 {
                built = built.with_causal_span(0, start_char as i64);
            }
            out.push(built);
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn classify(
        &self,
        context: &SchemaContext,
        window: &Window<'_>,
    ) -> Result<ChunkClassification, ClassifierError> {
        let fragments = self.classify_chunk(context.active(), window.text);
        Ok(ChunkClassification {
            fragments,
            alternatives: Vec::new(),
        })
    }
}

fn descriptor(
    text: &str,
    start_byte: usize,
    end_byte: usize,
    schema: SchemaId,
    confidence: f64,
    rationale: &str,
) -> FragmentDescriptor {
    FragmentDescriptor::new(
        char_offset(text, start_byte) as i64,
        char_offset(text, end_byte) as i64,
        schema.as_str(),
    )
    .with_confidence(confidence)
    .with_rationale(rationale)
}

/// Byte ranges of blank-line-separated blocks, trailing whitespace
/// excluded.
fn paragraph_blocks(text: &str) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    let mut block_start: Option<usize> = None;
    let mut block_end = 0;
    for line in text.split_inclusive('\n') {
        let line_start = cursor;
        cursor += line.len();
        if line.trim().is_empty() {
            if let Some(start) = block_start.take() {
                blocks.push((start, block_end));
            }
        } else {
            if block_start.is_none() {
                block_start = Some(line_start);
            }
            block_end = line_start + line.trim_end().len();
        }
    }
    if let Some(start) = block_start {
        blocks.push((start, block_end));
    }
    blocks
}

/// Byte range of the sentence containing a marker match. Sentences run
/// from the previous period or newline to the next one, terminator
/// included.
fn sentence_bounds(text: &str, marker_start: usize, marker_end: usize) -> (usize, usize) {
    let mut start = text[..marker_start]
        .rfind(|c| c == '.' || c == '\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let rest = &text[start..];
    start += rest.len() - rest.trim_start().len();
    let end = text[marker_end..]
        .find(|c| c == '.' || c == '\n')
        .map(|i| marker_end + i + 1)
        .unwrap_or(text.len());
    (start, end)
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
