use uuid::Uuid;

use fintrack_domain::{position_of, Category, Ledger};

use crate::error::{CoreError, CoreResult, EntityKind};

pub struct CategoryService;

impl CategoryService {
    pub fn add(ledger: &mut Ledger, category: Category) -> CoreResult<Uuid> {
        Self::validate_name(ledger, None, &category.name)?;
        Ok(ledger.add_category(category))
    }

    /// Replaces name, icon and color of an existing category.
    pub fn edit(ledger: &mut Ledger, id: Uuid, changes: Category) -> CoreResult<()> {
        Self::validate_name(ledger, Some(id), &changes.name)?;
        let category = ledger
            .category_mut(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Category, id))?;
        category.name = changes.name.trim().to_string();
        category.icon = changes.icon;
        category.color = changes.color;
        ledger.touch();
        Ok(())
    }

    /// Removes a category. Historic transactions keep the dangling id; a
    /// category that still has a budget cannot be removed.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> CoreResult<Category> {
        if let Some(budget) = ledger.budget_for_category(id) {
            return Err(CoreError::Validation(format!(
                "Category has budget {}; remove it first",
                budget.id
            )));
        }
        let index = position_of(&ledger.categories, id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Category, id))?;
        let removed = ledger.categories.remove(index);
        ledger.touch();
        Ok(removed)
    }

    pub fn list(ledger: &Ledger) -> Vec<&Category> {
        ledger.categories.iter().collect()
    }

    fn validate_name(ledger: &Ledger, exclude: Option<Uuid>, candidate: &str) -> CoreResult<()> {
        let normalized = candidate.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::Validation(
                "category name must not be empty".into(),
            ));
        }
        let duplicate = ledger.categories.iter().any(|category| {
            category.name.trim().to_lowercase() == normalized
                && exclude.map_or(true, |id| category.id != id)
        });
        if duplicate {
            Err(CoreError::Validation(format!(
                "Category `{}` already exists",
                candidate.trim()
            )))
        } else {
            Ok(())
        }
    }
}
