//! Roster descriptions and their conversion into battle-ready combatants.

use crate::config::Ruleset;
use crate::data::Catalog;
use crate::error::EngineError;
use crate::sim::combatant::Combatant;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub species: String,
    /// Falls back to the ruleset's default level.
    #[serde(default)]
    pub level: Option<u8>,
    pub moves: Vec<String>,
    /// Falls back to the species' first listed ability.
    #[serde(default)]
    pub ability: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub members: Vec<MemberSpec>,
}

/// Builds the roster for one side. Unknown species and moves degrade to
/// catalog fallbacks. Roster and moveset sizes are enforced, and so is
/// [`check_member_legality`].
pub fn materialize_team(
    catalog: &dyn Catalog,
    spec: &TeamSpec,
    ruleset: &Ruleset,
) -> Result<Vec<Combatant>, EngineError> {
    if spec.members.is_empty() || spec.members.len() > ruleset.max_team_size {
        return Err(EngineError::InvalidTeam(format!(
            "roster must hold 1 to {} members, got {}",
            ruleset.max_team_size,
            spec.members.len()
        )));
    }
    spec.members
        .iter()
        .map(|member| {
            if member.moves.is_empty() || member.moves.len() > ruleset.max_moves {
                return Err(EngineError::InvalidTeam(format!(
                    "{} must know 1 to {} moves, got {}",
                    member.species,
                    ruleset.max_moves,
                    member.moves.len()
                )));
            }
            check_member_legality(catalog, member, ruleset)?;
            let species = catalog.species_or_placeholder(&member.species);
            let moves = member
                .moves
                .iter()
                .map(|id| catalog.move_or_struggle(id))
                .collect();
            let ability = member
                .ability
                .clone()
                .or_else(|| species.abilities.first().cloned())
                .unwrap_or_default();
            let level = member.level.unwrap_or(ruleset.default_level);
            Ok(Combatant::new(&species, level, moves, ability, member.item.clone()))
        })
        .collect()
}

/// Rejects a species outside the ruleset's generations and any catalog move
/// missing from the species' learnset. Records the catalog lacks are left to
/// the fallbacks.
pub fn check_member_legality(
    catalog: &dyn Catalog,
    member: &MemberSpec,
    ruleset: &Ruleset,
) -> Result<(), EngineError> {
    let Ok(species) = catalog.species(&member.species) else {
        return Ok(());
    };
    if !ruleset.generations.is_empty()
        && !species
            .generation()
            .map_or(false, |generation| ruleset.generations.contains(&generation))
    {
        return Err(EngineError::InvalidTeam(format!(
            "{} is not allowed in generations {:?}",
            species.name, ruleset.generations
        )));
    }
    if let Some(illegal) = member
        .moves
        .iter()
        .find(|id| catalog.move_data(id).is_ok() && !species.can_learn(id))
    {
        return Err(EngineError::InvalidTeam(format!(
            "{} cannot learn {illegal}",
            species.name
        )));
    }
    Ok(())
}

/// Parses blank-line separated member blocks. The first line of a block is
/// `Species | item | ability | move, move`; trailing fields may be omitted.
/// Further lines may be `Level: N` or `- move`.
pub fn parse_team_text(text: &str) -> Result<TeamSpec> {
    let mut members = Vec::new();
    for (idx, chunk) in text.split("\n\n").enumerate() {
        let entry = parse_entry(chunk.trim())
            .with_context(|| format!("Failed to parse team entry {}", idx + 1))?;
        if let Some(member) = entry {
            members.push(member);
        }
    }
    if members.is_empty() {
        bail!("Team text contains no members");
    }
    Ok(TeamSpec {
        name: None,
        members,
    })
}

fn optional_field(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty() && *value != "-")
        .map(str::to_string)
}

fn parse_entry(entry: &str) -> Result<Option<MemberSpec>> {
    if entry.is_empty() {
        return Ok(None);
    }
    let mut lines = entry.lines().map(str::trim).filter(|line| !line.is_empty());
    let header = lines.next().ok_or_else(|| anyhow!("Species line is missing"))?;
    let mut fields = header.split('|');
    let species = optional_field(fields.next()).ok_or_else(|| anyhow!("Failed to read species name"))?;
    let item = optional_field(fields.next());
    let ability = optional_field(fields.next());
    let mut moves: Vec<String> = fields
        .next()
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if fields.next().is_some() {
        bail!("Too many `|` separated fields in `{header}`");
    }

    let mut level = None;
    for line in lines {
        if let Some(rest) = line.strip_prefix("Level:") {
            let parsed = rest
                .trim()
                .parse()
                .with_context(|| format!("Invalid level `{}`", rest.trim()))?;
            level = Some(parsed);
            continue;
        }
        if let Some(rest) = line.strip_prefix('-') {
            let move_name = rest.trim();
            if !move_name.is_empty() {
                moves.push(move_name.to_string());
            }
            continue;
        }
        bail!("Unrecognized line `{line}`");
    }

    Ok(Some(MemberSpec {
        species,
        level,
        moves,
        ability,
        item,
    }))
}

/// Inverse of [`parse_team_text`]; levels are only written when set.
pub fn export_team_text(spec: &TeamSpec) -> String {
    spec.members
        .iter()
        .map(|member| {
            let mut block = format!(
                "{} | {} | {} | {}",
                member.species,
                member.item.as_deref().unwrap_or("-"),
                member.ability.as_deref().unwrap_or("-"),
                member.moves.join(", ")
            );
            if let Some(level) = member.level {
                block.push_str(&format!("\nLevel: {level}"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builtin;

    const SAMPLE: &str = "Garchomp | Choice Scarf | Sand Veil | Earthquake, Dragon Claw, Stone Edge\n\n\
        Ferrothorn | Leftovers | - | Stealth Rock, Leech Seed\n- Protect\nLevel: 55\n\n\
        Gengar";

    #[test]
    fn parses_lite_blocks() {
        let team = parse_team_text(SAMPLE).expect("sample parses");
        assert_eq!(team.members.len(), 3);
        let chomp = &team.members[0];
        assert_eq!(chomp.item.as_deref(), Some("Choice Scarf"));
        assert_eq!(chomp.ability.as_deref(), Some("Sand Veil"));
        assert_eq!(chomp.moves, vec!["Earthquake", "Dragon Claw", "Stone Edge"]);
        let ferro = &team.members[1];
        assert_eq!(ferro.ability, None);
        assert_eq!(ferro.level, Some(55));
        assert_eq!(ferro.moves.last().map(String::as_str), Some("Protect"));
        assert!(team.members[2].moves.is_empty());
    }

    #[test]
    fn export_parses_back() {
        let team = parse_team_text(SAMPLE).expect("sample parses");
        let again = parse_team_text(&export_team_text(&team)).expect("export parses");
        assert_eq!(again, team);
    }

    #[test]
    fn rejects_garbage_lines() {
        let err = parse_team_text("Pikachu | - | - | Thunderbolt\nEVs: 252 Spe").unwrap_err();
        assert!(format!("{err:#}").contains("team entry 1"));
        assert!(parse_team_text("\n\n").is_err());
    }

    #[test]
    fn materialize_applies_fallbacks() {
        let catalog = builtin().expect("bundled catalog parses");
        let spec = TeamSpec {
            name: None,
            members: vec![MemberSpec {
                species: "Missingmon".to_string(),
                level: None,
                moves: vec!["tackle".to_string(), "not-a-move".to_string()],
                ability: None,
                item: Some("Leftovers".to_string()),
            }],
        };
        let roster = materialize_team(catalog.as_ref(), &spec, &Ruleset::default()).expect("valid team");
        let mon = &roster[0];
        assert_eq!(mon.level, 50);
        assert!(mon.moves[1].data.is_struggle());
        assert_eq!(mon.item.as_deref(), Some("leftovers"));
    }

    #[test]
    fn materialize_enforces_sizes() {
        let catalog = builtin().expect("bundled catalog parses");
        let ruleset = Ruleset::default();
        let member = MemberSpec {
            species: "pikachu".to_string(),
            moves: vec!["tackle".to_string()],
            ..MemberSpec::default()
        };
        let too_many = TeamSpec {
            name: None,
            members: vec![member.clone(); 7],
        };
        assert!(matches!(
            materialize_team(catalog.as_ref(), &too_many, &ruleset),
            Err(EngineError::InvalidTeam(_))
        ));
        let no_moves = TeamSpec {
            name: None,
            members: vec![MemberSpec {
                moves: Vec::new(),
                ..member
            }],
        };
        assert!(materialize_team(catalog.as_ref(), &no_moves, &ruleset).is_err());
    }

    #[test]
    fn learnsets_gate_catalog_moves() {
        let catalog = builtin().expect("bundled catalog parses");
        let ruleset = Ruleset::default();
        let team = parse_team_text(
            "Ferrothorn | Leftovers | - | Stealth Rock, Leech Seed, Protect\n\n\
             Garchomp | - | - | Earthquake, Dragon Claw, Stone Edge, Swords Dance",
        )
        .expect("team parses");
        let roster = materialize_team(catalog.as_ref(), &team, &ruleset).expect("legal team");
        assert_eq!(roster.len(), 2);

        let illegal = parse_team_text("Snorlax | - | - | Tackle, Leech Seed").expect("team parses");
        let err = materialize_team(catalog.as_ref(), &illegal, &ruleset).unwrap_err();
        assert!(matches!(&err, EngineError::InvalidTeam(reason) if reason.contains("Leech Seed")));
    }

    #[test]
    fn generation_filter_rejects_newer_species() {
        let catalog = builtin().expect("bundled catalog parses");
        let ruleset = Ruleset {
            generations: vec![1],
            ..Ruleset::default()
        };
        let kanto = parse_team_text("Snorlax | - | - | Tackle").expect("team parses");
        assert!(materialize_team(catalog.as_ref(), &kanto, &ruleset).is_ok());
        let sinnoh = parse_team_text("Garchomp | - | - | Earthquake").expect("team parses");
        assert!(matches!(
            materialize_team(catalog.as_ref(), &sinnoh, &ruleset),
            Err(EngineError::InvalidTeam(_))
        ));
        let unknown = parse_team_text("Missingmon | - | - | Tackle").expect("team parses");
        assert!(materialize_team(catalog.as_ref(), &unknown, &ruleset).is_ok());
    }
}
