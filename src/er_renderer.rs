use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::dot_graph::{DotGraph, Label, Style};
use crate::er_ast::{Attribute, AttributeKind, Count, Entity, EntityInfo, Relation};
use crate::er_layout::{LayoutOptions, RenderOptions};
use crate::error::{ErdError, RenderError};
use crate::uid::IdGenerator;

const GRAPH_NAME: &str = "erd";
const DOUBLE_LINE: &str = "black:invis:black";
const LABEL_DISTANCE: &str = "1.5";
const FIRST_MANY_LETTER: char = 'N';

/// Writes `destination` (DOT) and returns the rendered `destination.<format>`.
pub fn render(
    entities: &[Arc<Entity>],
    relations: &[Relation],
    destination: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<PathBuf, ErdError> {
    let ids = IdGenerator::new();
    let graph = build(entities, relations, &options.layout, &ids)?;
    graph.export(destination, &options.format)
}

pub fn build<'a>(
    entities: &[Arc<Entity>],
    relations: &[Relation],
    layout: &LayoutOptions,
    ids: &'a IdGenerator,
) -> Result<DotGraph<'a>, RenderError> {
    let mut graph = DotGraph::new(GRAPH_NAME, layout.engine(), layout.graph_attributes(), ids);
    info!(
        entities = entities.len(),
        relations = relations.len(),
        engine = layout.engine().name();
        "building Chen diagram"
    );

    let mut entity_ids: HashMap<*const Entity, String> = HashMap::new();
    let mut entity_nodes = Vec::with_capacity(entities.len());
    {
        let mut boxes = graph.node_style(Style::new().with("shape", "box"));
        for entity in entities {
            let key = Arc::as_ptr(entity);
            if entity_ids.contains_key(&key) {
                return Err(RenderError::DuplicateEntity {
                    entity: entity.name.clone(),
                });
            }
            let id = draw_entity(&mut boxes, entity);
            entity_ids.insert(key, id.clone());
            entity_nodes.push(id);
        }
    }

    let mut relation_nodes = Vec::with_capacity(relations.len());
    {
        let mut diamonds = graph.node_style(Style::new().with("shape", "diamond"));
        for relation in relations {
            relation_nodes.push(draw_relation(&mut diamonds, &entity_ids, relation)?);
        }
    }

    {
        let mut ovals = graph.node_style(Style::new().with("shape", "oval"));
        for (entity, id) in entities.iter().zip(&entity_nodes) {
            draw_attributes(&mut ovals, id, &entity.attributes)?;
        }
        for (relation, id) in relations.iter().zip(&relation_nodes) {
            draw_attributes(&mut ovals, id, relation.attributes())?;
        }
    }

    info!(nodes = graph.node_count(), edges = graph.edge_count(); "Chen diagram built");
    Ok(graph)
}

fn draw_entity(graph: &mut DotGraph<'_>, entity: &Entity) -> String {
    let weak = entity.is_weak();
    debug!(entity = entity.name.as_str(), weak = weak; "drawing entity");
    let style = if weak {
        Style::new().with("peripheries", "2")
    } else {
        Style::new()
    };
    graph.create_node(entity.name.as_str(), style)
}

fn draw_relation(
    graph: &mut DotGraph<'_>,
    entity_ids: &HashMap<*const Entity, String>,
    relation: &Relation,
) -> Result<String, RenderError> {
    debug!(
        relation = relation.display_name(),
        identifying = relation.is_identifying();
        "drawing relation"
    );
    let style = if relation.is_identifying() {
        Style::new().with("peripheries", "2")
    } else {
        Style::new()
    };
    let relation_id = graph.create_node(relation.name().unwrap_or_default(), style);

    let infos = relation.entity_infos();
    let totals = total_participation(infos);
    let cardinalities = cardinality_labels(infos);

    for ((info, total), cardinality) in infos.iter().zip(totals).zip(cardinalities) {
        let entity_id = entity_ids.get(&Arc::as_ptr(&info.entity)).ok_or_else(|| {
            RenderError::UnknownEntity {
                relation: relation.display_name().to_string(),
                entity: info.entity.name.clone(),
            }
        })?;

        let mut style = Style::new();
        if let Some(cardinality) = cardinality {
            style.set("headlabel", cardinality);
        }
        style.set("labeldistance", LABEL_DISTANCE);
        if total {
            style.set("color", DOUBLE_LINE);
        }
        graph.create_edge(entity_id, &relation_id, info.role.as_deref(), style)?;
    }

    Ok(relation_id)
}

// Any participant whose count allows zero (or is absent) makes every other
// participant partial; a participant's own count never affects its own flag.
pub fn total_participation(infos: &[EntityInfo]) -> Vec<bool> {
    let mut totals = vec![true; infos.len()];
    for (i, info) in infos.iter().enumerate() {
        if !info.count.is_none_or(Count::is_optional) {
            continue;
        }
        for (j, total) in totals.iter_mut().enumerate() {
            if j != i {
                *total = false;
            }
        }
    }
    totals
}

/// Many-valued counts share one letter cursor: `N`, `M`, `L`, ...
pub fn cardinality_labels(infos: &[EntityInfo]) -> Vec<Option<String>> {
    let mut many = FIRST_MANY_LETTER;
    infos
        .iter()
        .map(|info| match info.count {
            Some(Count::AtLeastOne | Count::Any) => {
                let letter = many;
                many = prev_letter(many);
                Some(letter.to_string())
            }
            Some(Count::ZeroOrOne) => Some("1".to_string()),
            Some(Count::Exactly(n)) => Some(n.to_string()),
            None => None,
        })
        .collect()
}

fn prev_letter(letter: char) -> char {
    debug_assert!(letter.is_ascii_alphabetic());
    let base = if letter.is_ascii_uppercase() { b'A' } else { b'a' };
    let offset = (letter as u8 - base + 25) % 26;
    char::from(base + offset)
}

fn draw_attributes(
    graph: &mut DotGraph<'_>,
    parent: &str,
    attributes: &[Attribute],
) -> Result<(), RenderError> {
    for attribute in attributes {
        let (label, style) = attribute_visual(attribute);
        let id = graph.create_node(label, style);
        graph.create_edge(&id, parent, None, Style::new())?;
        draw_attributes(graph, &id, &attribute.subattributes)?;
    }
    Ok(())
}

fn attribute_visual(attribute: &Attribute) -> (Label, Style) {
    let name = attribute.name.as_str();
    match attribute.kind {
        AttributeKind::Plain => (Label::from(name), Style::new()),
        AttributeKind::Key => (
            Label::Html(format!("<U>{}</U>", escape_html(name))),
            Style::new(),
        ),
        AttributeKind::WeakKey => (Label::Html(dashed_underline(name)), Style::new()),
        AttributeKind::Derived => (Label::from(name), Style::new().with("style", "dashed")),
        AttributeKind::Multivalued => (Label::from(name), Style::new().with("peripheries", "2")),
    }
}

// no dashed underline in Graphviz
fn dashed_underline(text: &str) -> String {
    text.chars()
        .enumerate()
        .map(|(i, ch)| {
            let ch = escape_html(ch.encode_utf8(&mut [0; 4]));
            if i % 2 == 0 {
                format!("<U>{ch}</U>")
            } else {
                ch
            }
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::er_parser::parse_attribute;
    use pretty_assertions::assert_eq;

    fn entity(name: &str, definitions: &[&str]) -> Arc<Entity> {
        Arc::new(Entity::parse(name, definitions.iter().copied()).unwrap())
    }

    fn infos(counts: &[Option<Count>]) -> Vec<EntityInfo> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| EntityInfo {
                entity: entity(&format!("E{i}"), &["*id"]),
                count,
                role: None,
            })
            .collect()
    }

    fn source(entities: &[Arc<Entity>], relations: &[Relation]) -> String {
        let ids = IdGenerator::new();
        build(entities, relations, &LayoutOptions::default(), &ids)
            .unwrap()
            .source()
    }

    #[test]
    fn many_letters_count_down_from_n() {
        let labels = cardinality_labels(&infos(&[
            Some(Count::Any),
            Some(Count::AtLeastOne),
            Some(Count::ZeroOrOne),
        ]));
        assert_eq!(
            labels,
            vec![Some("N".into()), Some("M".into()), Some("1".into())]
        );
    }

    #[test]
    fn exact_and_absent_counts() {
        assert_eq!(
            cardinality_labels(&infos(&[Some(Count::Exactly(3)), Some(Count::Any)])),
            vec![Some("3".into()), Some("N".into())]
        );
        assert_eq!(cardinality_labels(&infos(&[None, None])), vec![None, None]);
    }

    #[test]
    fn many_letters_wrap_within_case() {
        assert_eq!(prev_letter('N'), 'M');
        assert_eq!(prev_letter('A'), 'Z');
        assert_eq!(prev_letter('a'), 'z');

        let labels = cardinality_labels(&infos(&[Some(Count::Any); 15]));
        assert_eq!(labels[13], Some("A".into()));
        assert_eq!(labels[14], Some("Z".into()));
    }

    #[test]
    fn optional_sibling_makes_others_partial() {
        let totals = total_participation(&infos(&[Some(Count::Exactly(1)), Some(Count::ZeroOrOne)]));
        assert_eq!(totals, vec![true, false]);
    }

    #[test]
    fn mandatory_siblings_keep_total() {
        assert_eq!(
            total_participation(&infos(&[Some(Count::Exactly(1)), Some(Count::AtLeastOne)])),
            vec![true, true]
        );
    }

    #[test]
    fn two_optional_participants_are_both_partial() {
        assert_eq!(
            total_participation(&infos(&[Some(Count::Any), Some(Count::ZeroOrOne)])),
            vec![false, false]
        );
        assert_eq!(total_participation(&infos(&[None, None])), vec![false, false]);
    }

    #[test]
    fn explicit_zero_counts_as_optional() {
        assert_eq!(
            total_participation(&infos(&[
                Some(Count::Exactly(1)),
                Some(Count::Exactly(1)),
                Some(Count::Exactly(0)),
            ])),
            vec![false, false, true]
        );
    }

    #[test]
    fn weak_key_underlines_every_other_letter() {
        assert_eq!(dashed_underline("abcd"), "<U>a</U>b<U>c</U>d");
        assert_eq!(dashed_underline("a b"), "<U>a</U> <U>b</U>");
        assert_eq!(dashed_underline("&x"), "<U>&amp;</U>x");
    }

    #[test]
    fn attribute_kinds_map_to_decorations() {
        let visual = |definition: &str| attribute_visual(&parse_attribute(definition).unwrap());

        assert_eq!(visual("name"), (Label::from("name"), Style::new()));
        assert_eq!(visual("*id").0, Label::Html("<U>id</U>".into()));
        assert_eq!(visual("+no").0, Label::Html("<U>n</U>o".into()));
        assert_eq!(visual("~age").1, Style::new().with("style", "dashed"));
        assert_eq!(visual("tags[]").1, Style::new().with("peripheries", "2"));
        assert_eq!(visual("*R&D").0, Label::Html("<U>R&amp;D</U>".into()));
    }

    #[test]
    fn weak_entity_and_identifying_relation_are_doubled() {
        let employee = entity("Employee", &["*id"]);
        let dependent = entity("Dependent", &["+name"]);
        let relation = Relation::builder()
            .entity((&dependent, Count::Any))
            .entity((&employee, Count::Exactly(1)))
            .name("Dependents-Of")
            .identifying(true)
            .build()
            .unwrap();
        let dot = source(&[employee, dependent], &[relation]);

        assert!(dot.contains("\"1\" [label=\"Employee\" shape=\"box\"]\n"), "{dot}");
        assert!(dot.contains("\"2\" [label=\"Dependent\" shape=\"box\" peripheries=\"2\"]"), "{dot}");
        assert!(
            dot.contains("\"3\" [label=\"Dependents-Of\" shape=\"diamond\" peripheries=\"2\"]"),
            "{dot}"
        );
        // a dependent count of 0..* leaves the employee edge single
        assert!(
            dot.contains(
                "\"2\" -- \"3\" [headlabel=\"N\" labeldistance=\"1.5\" color=\"black:invis:black\"]"
            ),
            "{dot}"
        );
        assert!(
            dot.contains("\"1\" -- \"3\" [headlabel=\"1\" labeldistance=\"1.5\"]\n"),
            "{dot}"
        );
    }

    #[test]
    fn roles_label_self_relation_edges() {
        let staff = entity("Staff", &["*staffNo"]);
        let relation = Relation::builder()
            .entity((&staff, Count::ZeroOrOne, "Supervisor"))
            .entity((&staff, Count::Any, "Supervisee"))
            .name("Supervises")
            .build()
            .unwrap();
        let dot = source(&[staff], &[relation]);

        assert!(dot.contains("[label=\"Supervisor\" headlabel=\"1\" labeldistance=\"1.5\"]"));
        assert!(dot.contains("[label=\"Supervisee\" headlabel=\"N\" labeldistance=\"1.5\"]"));
    }

    #[test]
    fn composite_attributes_nest() {
        let student = entity("Student", &["*id", "address: city street"]);
        let dot = source(&[student], &[]);

        // 1 = Student, 2 = id, 3 = address, 4 = city, 5 = street
        assert!(dot.contains("\t\"2\" -- \"1\"\n"));
        assert!(dot.contains("\t\"3\" -- \"1\"\n"));
        assert!(dot.contains("\t\"4\" -- \"3\"\n"));
        assert!(dot.contains("\t\"5\" -- \"3\"\n"));
    }

    #[test]
    fn deep_composites_recurse() {
        let inner = Attribute::composite("b", vec![Attribute::new("c", AttributeKind::Derived)]);
        let outer = Attribute::new("a", AttributeKind::Multivalued).with_subattributes(vec![inner]);
        let thing = Arc::new(Entity::new("Thing", vec![outer]));
        let dot = source(&[thing], &[]);

        assert!(dot.contains("\"2\" [label=\"a\" shape=\"oval\" peripheries=\"2\"]"));
        assert!(dot.contains("\"3\" [label=\"b\" shape=\"oval\"]"));
        assert!(dot.contains("\"4\" [label=\"c\" shape=\"oval\" style=\"dashed\"]"));
        assert!(dot.contains("\t\"4\" -- \"3\"\n"));
        assert!(dot.contains("\t\"3\" -- \"2\"\n"));
    }

    #[test]
    fn relation_attributes_hang_off_the_diamond() {
        let employee = entity("Employee", &["*id"]);
        let project = entity("Project", &["*id"]);
        let relation = Relation::builder()
            .entity((&employee, Count::AtLeastOne))
            .entity((&project, Count::AtLeastOne))
            .name("Works-On")
            .attribute(Attribute::plain("Hours"))
            .build()
            .unwrap();
        let dot = source(&[employee, project], &[relation]);

        // 1, 2 entities; 3 relation; 4, 5 entity keys; 6 Hours
        assert!(dot.contains("\"6\" [label=\"Hours\" shape=\"oval\"]"));
        assert!(dot.contains("\t\"6\" -- \"3\"\n"));
    }

    #[test]
    fn unnamed_relation_has_empty_label() {
        let a = entity("A", &["*id"]);
        let b = entity("B", &["*id"]);
        let relation = Relation::builder().entity(&a).entity(&b).build().unwrap();
        let dot = source(&[a, b], &[relation]);
        assert!(dot.contains("\"3\" [label=\"\" shape=\"diamond\"]"));
        assert!(dot.contains("\"1\" -- \"3\" [labeldistance=\"1.5\"]"));
    }

    #[test]
    fn duplicate_entity_is_rejected() {
        let a = entity("A", &["*id"]);
        let ids = IdGenerator::new();
        let err = build(&[a.clone(), a], &[], &LayoutOptions::default(), &ids).unwrap_err();
        assert_eq!(err, RenderError::DuplicateEntity { entity: "A".into() });
    }

    #[test]
    fn equal_entities_are_still_distinct_nodes() {
        let a1 = entity("A", &["*id"]);
        let a2 = entity("A", &["*id"]);
        let dot = source(&[a1, a2], &[]);
        assert_eq!(dot.matches("label=\"A\"").count(), 2);
    }

    #[test]
    fn relation_to_unlisted_entity_is_rejected() {
        let a = entity("A", &["*id"]);
        let b = entity("B", &["*id"]);
        let relation = Relation::builder()
            .entity((&a, Count::Exactly(1)))
            .entity((&b, Count::Any))
            .name("R")
            .build()
            .unwrap();
        let ids = IdGenerator::new();
        let err = build(&[a], &[relation], &LayoutOptions::default(), &ids).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownEntity {
                relation: "R".into(),
                entity: "B".into()
            }
        );
    }

    #[test]
    fn render_surfaces_engine_failures() {
        let dir = tempfile::tempdir().unwrap();
        let a = entity("A", &["*id"]);
        let options = RenderOptions {
            format: "definitely-not-a-format".into(),
            ..RenderOptions::default()
        };
        // Either sfdp is missing or it rejects the format; both must fail cleanly.
        let result = render(&[a], &[], dir.path().join("out.gv"), &options);
        assert!(result.is_err());
        assert!(!dir.path().join("out.gv").exists());
    }
}
