//! Built-in models.

use crate::{
    public_data, FieldDeclaration, FieldSet, FieldType, ImmutableModel, ModelContract, PublicData,
    SelectionState,
};
use tabula_core::{ApiError, DescriptionTable, ErrorCode, Phrase};

/// One entry of the envelope's `errors[]` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorModel {
    code: ErrorCode,
    input_field: Option<String>,
    description: Phrase,
}

impl ErrorModel {
    /// Projects a contract error, rendering its description from `table`.
    #[must_use]
    pub fn from_error(error: &ApiError, table: &dyn DescriptionTable) -> Self {
        Self {
            code: error.code(),
            input_field: error.input_field().map(str::to_string),
            description: error.description(table),
        }
    }
}

impl ModelContract for ErrorModel {
    const NAME: &'static str = "Error";
    const DESCRIPTION: Option<&'static str> = Some("Error information");

    fn fields() -> FieldSet {
        FieldSet::from([
            ("code", FieldDeclaration::integer(false)),
            ("input_field", FieldDeclaration::string(true)),
            ("description", FieldDeclaration::phrase(false)),
        ])
    }
}

impl ImmutableModel for ErrorModel {
    fn public_data(&self) -> PublicData {
        public_data! {
            "code" => self.code,
            "input_field" => self.input_field.clone(),
            "description" => self.description.clone(),
        }
    }
}

/// Pagination details returned next to a page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDataModel {
    state: SelectionState,
}

impl SelectionDataModel {
    /// Wraps a resolved selection.
    #[must_use]
    pub const fn new(state: SelectionState) -> Self {
        Self { state }
    }
}

impl ModelContract for SelectionDataModel {
    const NAME: &'static str = "SelectionData";
    const DESCRIPTION: Option<&'static str> = Some("Selection information");

    fn fields() -> FieldSet {
        FieldSet::from([
            ("limit", FieldDeclaration::integer(false).with_description("Page size")),
            (
                "total_amount",
                FieldDeclaration::integer(false).with_description("Total number of items"),
            ),
            ("page", FieldDeclaration::integer(false).with_description("Current page")),
            (
                "pages_total",
                FieldDeclaration::integer(false).with_description("Total number of pages"),
            ),
            ("sort_by", FieldDeclaration::string(false).with_description("Sort key")),
            (
                "sort_direction",
                FieldDeclaration::string(false).with_description("Sort direction"),
            ),
            (
                "sort_variants",
                FieldDeclaration::array_of_scalar(FieldType::String)
                    .with_description("Accepted sort keys"),
            ),
        ])
    }
}

impl ImmutableModel for SelectionDataModel {
    fn public_data(&self) -> PublicData {
        let state = &self.state;
        public_data! {
            "limit" => state.limit(),
            "total_amount" => state.total_amount(),
            "page" => state.page(),
            "pages_total" => state.pages_total(),
            "sort_by" => state.sort_by(),
            "sort_direction" => state.sort_direction().as_str(),
            "sort_variants" => state.sort_variants().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelValue, SelectionSpec, SortDirection};
    use tabula_core::{ErrorDescriptions, Locale};

    fn keys(data: &PublicData) -> Vec<&str> {
        data.keys().map(String::as_str).collect()
    }

    fn declared<M: ModelContract>() -> Vec<&'static str> {
        M::fields().keys().copied().collect()
    }

    #[test]
    fn test_error_model_round_trip() {
        let error = ApiError::with_field(3011, "year").with_var("min", 1450);
        let model = ErrorModel::from_error(&error, ErrorDescriptions::builtin());
        let data = model.public_data();
        assert_eq!(keys(&data), declared::<ErrorModel>());
        assert_eq!(model.description.get(Locale::En), Some("Minimum value is 1450"));
    }

    #[test]
    fn test_selection_data_round_trip() {
        let spec = SelectionSpec::new("id", SortDirection::Desc).with_variant("title");
        let model = SelectionDataModel::new(SelectionState::new(&spec, 42));
        let value = ModelValue::immutable(model);
        let data = value.public_data(None);
        assert_eq!(keys(&data), declared::<SelectionDataModel>());
        assert_eq!(value.name(), "SelectionData");
    }
}
