//! Structural model - the snapshot an analysis runs against
//!
//! Entities are kept in declaration order; that order fixes DOF numbering and
//! the order results are reported in. Edits go through the `add_*`/`remove_*`
//! methods, which keep every reference resolvable.

use serde::{Deserialize, Serialize};

use crate::elements::{Beam, Material, Node, Plate, Section};
use crate::error::{AnalysisError, AnalysisResult};
use crate::loads::{BeamLoad, LoadCase, LoadCombination, NodeLoad, PlateLoad};

/// The structural model of one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralModel {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub beams: Vec<Beam>,
    #[serde(default)]
    pub plates: Vec<Plate>,
    #[serde(default)]
    pub load_cases: Vec<LoadCase>,
    #[serde(default)]
    pub load_combinations: Vec<LoadCombination>,
}

impl StructuralModel {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> AnalysisResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> AnalysisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ========================
    // Lookups
    // ========================

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn beam(&self, id: &str) -> Option<&Beam> {
        self.beams.iter().find(|b| b.id == id)
    }

    pub fn plate(&self, id: &str) -> Option<&Plate> {
        self.plates.iter().find(|p| p.id == id)
    }

    pub fn load_case(&self, id: &str) -> Option<&LoadCase> {
        self.load_cases.iter().find(|c| c.id == id)
    }

    pub fn load_combination(&self, id: &str) -> Option<&LoadCombination> {
        self.load_combinations.iter().find(|c| c.id == id)
    }

    /// Id of the first element that references `node`
    pub fn element_using_node(&self, node: &str) -> Option<&str> {
        self.beams
            .iter()
            .find(|b| b.start_node == node || b.end_node == node)
            .map(|b| b.id.as_str())
            .or_else(|| {
                self.plates
                    .iter()
                    .find(|p| p.nodes.iter().any(|n| n == node))
                    .map(|p| p.id.as_str())
            })
    }

    /// Whether any node, beam or plate carries a load
    pub fn has_loads(&self) -> bool {
        self.nodes.iter().any(|n| !n.loads.is_empty())
            || self.beams.iter().any(|b| !b.loads.is_empty())
            || self.plates.iter().any(|p| !p.loads.is_empty())
    }

    // ========================
    // Model Building Methods
    // ========================

    pub fn add_node(&mut self, node: Node) -> AnalysisResult<()> {
        if self.node(&node.id).is_some() {
            return Err(AnalysisError::DuplicateId(node.id));
        }
        for load in &node.loads {
            self.require_load_case(&load.case)?;
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn add_material(&mut self, material: Material) -> AnalysisResult<()> {
        if self.material(&material.id).is_some() {
            return Err(AnalysisError::DuplicateId(material.id));
        }
        if material.e <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "material '{}' must have a positive elastic modulus",
                material.id
            )));
        }
        self.materials.push(material);
        Ok(())
    }

    pub fn add_section(&mut self, section: Section) -> AnalysisResult<()> {
        if self.section(&section.id).is_some() {
            return Err(AnalysisError::DuplicateId(section.id));
        }
        if self.material(&section.material).is_none() {
            return Err(AnalysisError::MaterialNotFound(section.material));
        }
        self.sections.push(section);
        Ok(())
    }

    pub fn add_beam(&mut self, beam: Beam) -> AnalysisResult<()> {
        if self.beam(&beam.id).is_some() {
            return Err(AnalysisError::DuplicateId(beam.id));
        }
        if beam.start_node == beam.end_node {
            return Err(AnalysisError::InvalidInput(format!(
                "beam '{}' starts and ends at node '{}'",
                beam.id, beam.start_node
            )));
        }
        for node in [&beam.start_node, &beam.end_node] {
            if self.node(node).is_none() {
                return Err(AnalysisError::NodeNotFound(node.clone()));
            }
        }
        if self.section(&beam.section).is_none() {
            return Err(AnalysisError::SectionNotFound(beam.section));
        }
        for load in &beam.loads {
            self.require_load_case(load.case())?;
        }
        self.beams.push(beam);
        Ok(())
    }

    pub fn add_plate(&mut self, plate: Plate) -> AnalysisResult<()> {
        if self.plate(&plate.id).is_some() {
            return Err(AnalysisError::DuplicateId(plate.id));
        }
        if plate.nodes.len() < 3 {
            return Err(AnalysisError::InvalidInput(format!(
                "plate '{}' needs at least 3 nodes",
                plate.id
            )));
        }
        for node in &plate.nodes {
            if self.node(node).is_none() {
                return Err(AnalysisError::NodeNotFound(node.clone()));
            }
        }
        if self.material(&plate.material).is_none() {
            return Err(AnalysisError::MaterialNotFound(plate.material));
        }
        if plate.thickness <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "plate '{}' must have a positive thickness",
                plate.id
            )));
        }
        for load in &plate.loads {
            self.require_load_case(load.case())?;
        }
        self.plates.push(plate);
        Ok(())
    }

    pub fn add_load_case(&mut self, case: LoadCase) -> AnalysisResult<()> {
        if self.load_case(&case.id).is_some() {
            return Err(AnalysisError::DuplicateId(case.id));
        }
        self.load_cases.push(case);
        Ok(())
    }

    pub fn add_load_combination(&mut self, combination: LoadCombination) -> AnalysisResult<()> {
        if self.load_combination(&combination.id).is_some() {
            return Err(AnalysisError::DuplicateId(combination.id));
        }
        for (case, _) in &combination.factors {
            self.require_load_case(case)?;
        }
        self.load_combinations.push(combination);
        Ok(())
    }

    pub fn add_node_load(&mut self, node: &str, load: NodeLoad) -> AnalysisResult<()> {
        self.require_load_case(&load.case)?;
        let target = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node)
            .ok_or_else(|| AnalysisError::NodeNotFound(node.to_string()))?;
        target.loads.push(load);
        Ok(())
    }

    pub fn add_beam_load(&mut self, beam: &str, load: BeamLoad) -> AnalysisResult<()> {
        self.require_load_case(load.case())?;
        let target = self
            .beams
            .iter_mut()
            .find(|b| b.id == beam)
            .ok_or_else(|| AnalysisError::BeamNotFound(beam.to_string()))?;
        target.loads.push(load);
        Ok(())
    }

    pub fn add_plate_load(&mut self, plate: &str, load: PlateLoad) -> AnalysisResult<()> {
        self.require_load_case(load.case())?;
        let target = self
            .plates
            .iter_mut()
            .find(|p| p.id == plate)
            .ok_or_else(|| AnalysisError::PlateNotFound(plate.to_string()))?;
        if let PlateLoad::VaryingPressure(varying) = &load {
            if varying.pressures.len() != target.nodes.len() {
                return Err(AnalysisError::InvalidInput(format!(
                    "plate '{}' has {} nodes but {} pressures were given",
                    plate,
                    target.nodes.len(),
                    varying.pressures.len()
                )));
            }
        }
        target.loads.push(load);
        Ok(())
    }

    fn require_load_case(&self, case: &str) -> AnalysisResult<()> {
        match self.load_case(case) {
            Some(_) => Ok(()),
            None => Err(AnalysisError::LoadCaseNotFound(case.to_string())),
        }
    }

    // ========================
    // Removal
    // ========================

    /// Remove a node that no element references
    pub fn remove_node(&mut self, id: &str) -> AnalysisResult<Node> {
        let index = self
            .node_index(id)
            .ok_or_else(|| AnalysisError::NodeNotFound(id.to_string()))?;
        if let Some(element) = self.element_using_node(id) {
            return Err(AnalysisError::NodeInUse(id.to_string(), element.to_string()));
        }
        Ok(self.nodes.remove(index))
    }

    pub fn remove_beam(&mut self, id: &str) -> AnalysisResult<Beam> {
        let index = self
            .beams
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| AnalysisError::BeamNotFound(id.to_string()))?;
        Ok(self.beams.remove(index))
    }

    pub fn remove_plate(&mut self, id: &str) -> AnalysisResult<Plate> {
        let index = self
            .plates
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AnalysisError::PlateNotFound(id.to_string()))?;
        Ok(self.plates.remove(index))
    }

    /// Remove a load case together with every load tagged with it.
    ///
    /// Rejected while a load combination references the case.
    pub fn remove_load_case(&mut self, id: &str) -> AnalysisResult<LoadCase> {
        let index = self
            .load_cases
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AnalysisError::LoadCaseNotFound(id.to_string()))?;
        if let Some(combo) = self.load_combinations.iter().find(|c| c.includes(id)) {
            return Err(AnalysisError::LoadCaseInUse(id.to_string(), combo.id.clone()));
        }

        for node in &mut self.nodes {
            node.loads.retain(|l| l.case != id);
        }
        for beam in &mut self.beams {
            beam.loads.retain(|l| l.case() != id);
        }
        for plate in &mut self.plates {
            plate.loads.retain(|l| l.case() != id);
        }
        Ok(self.load_cases.remove(index))
    }

    pub fn remove_load_combination(&mut self, id: &str) -> AnalysisResult<LoadCombination> {
        let index = self
            .load_combinations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AnalysisError::LoadCombinationNotFound(id.to_string()))?;
        Ok(self.load_combinations.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Restraint;
    use crate::loads::{CombinationCategory, LoadDirection};

    fn frame() -> StructuralModel {
        let mut model = StructuralModel::new("P1");
        model.add_load_case(LoadCase::dead()).unwrap();
        model.add_load_case(LoadCase::live()).unwrap();
        model.add_material(Material::steel("Steel")).unwrap();
        model
            .add_section(Section::rectangular("R1", "Steel", 0.1, 0.2))
            .unwrap();
        model
            .add_node(Node::new("N1", 0.0, 0.0, 0.0).with_restraint(Restraint::fixed()))
            .unwrap();
        model.add_node(Node::new("N2", 3.0, 0.0, 0.0)).unwrap();
        model.add_node(Node::new("N3", 3.0, 3.0, 0.0)).unwrap();
        model.add_beam(Beam::new("B1", "N1", "N2", "R1")).unwrap();
        model
            .add_node_load("N2", NodeLoad::fy(-10.0, "Dead"))
            .unwrap();
        model
            .add_beam_load("B1", BeamLoad::uniform(-2.0, LoadDirection::FY, "Live"))
            .unwrap();
        model
    }

    #[test]
    fn test_duplicate_and_dangling_references_are_rejected() {
        let mut model = frame();
        assert!(matches!(
            model.add_node(Node::new("N1", 9.0, 0.0, 0.0)),
            Err(AnalysisError::DuplicateId(_))
        ));
        assert!(matches!(
            model.add_beam(Beam::new("B2", "N1", "N9", "R1")),
            Err(AnalysisError::NodeNotFound(_))
        ));
        assert!(matches!(
            model.add_beam(Beam::new("B2", "N1", "N2", "R9")),
            Err(AnalysisError::SectionNotFound(_))
        ));
        assert!(matches!(
            model.add_beam(Beam::new("B2", "N1", "N1", "R1")),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            model.add_plate(Plate::new("P1", &["N1", "N2", "N3"], "Concrete", 0.2)),
            Err(AnalysisError::MaterialNotFound(_))
        ));
        assert!(matches!(
            model.add_node_load("N3", NodeLoad::fy(1.0, "Wind")),
            Err(AnalysisError::LoadCaseNotFound(_))
        ));
    }

    #[test]
    fn test_remove_node_in_use() {
        let mut model = frame();
        match model.remove_node("N2") {
            Err(AnalysisError::NodeInUse(node, element)) => {
                assert_eq!(node, "N2");
                assert_eq!(element, "B1");
            }
            other => panic!("expected NodeInUse, got {:?}", other),
        }
        assert!(model.remove_node("N3").is_ok());
        assert_eq!(model.nodes.len(), 2);
    }

    #[test]
    fn test_remove_load_case_cascades() {
        let mut model = frame();
        model.remove_load_case("Live").unwrap();
        assert!(model.beams[0].loads.is_empty());
        assert_eq!(model.nodes[1].loads.len(), 1);
    }

    #[test]
    fn test_remove_load_case_referenced_by_combination() {
        let mut model = frame();
        model
            .add_load_combination(
                LoadCombination::new("C1", CombinationCategory::Ultimate)
                    .with_case("Dead", 1.2)
                    .with_case("Live", 1.6),
            )
            .unwrap();
        assert!(matches!(
            model.remove_load_case("Dead"),
            Err(AnalysisError::LoadCaseInUse(_, _))
        ));
        model.remove_load_combination("C1").unwrap();
        assert!(model.remove_load_case("Dead").is_ok());
        assert!(model.nodes[1].loads.is_empty());
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let model = frame();
        let json = model.to_json().unwrap();
        let back = StructuralModel::from_json(&json).unwrap();
        let ids: Vec<&str> = back.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["N1", "N2", "N3"]);
        assert_eq!(back, model);
    }
}
