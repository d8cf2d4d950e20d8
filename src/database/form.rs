use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use crate::error::{Error, TypeError};

pub type FormData = HashMap<String, Value>;

/// Loosely-typed request payload, as the consuming web application
/// hands it over. Accessors convert on demand and report failures as
/// validation errors.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value, Error = TypeError>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new("Invalid type conversion").into()),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => {
                let raw = match value {
                    Value::String(v) => v.to_owned(),
                    Value::Number(v) => v.to_string(),
                    _ => return Err(TypeError::new("Failed to parse value as number").into()),
                };
                raw.parse()
                    .map_err(|_e| TypeError::new("Invalid type conversion").into())
            }
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Failed to parse value as string")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    pub fn get_array(&self, key: &str) -> Result<Vec<Value>, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_array() {
                Some(v) => Ok(v.to_owned()),
                None => Err(TypeError::new("Failed to parse value as array")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    pub fn get_list<T>(&self, key: &str) -> Result<Vec<T>, Error>
    where
        T: TryFrom<Value, Error = TypeError>,
    {
        self.get_array(key)?
            .into_iter()
            .map(|value| T::try_from(value).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> Form {
        Form::from_data(
            [
                (String::from("name"), json!("Solyanka")),
                (String::from("cooking_time"), json!("45")),
                (String::from("servings"), json!(4)),
                (String::from("tags"), json!([1, 2, 3])),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn strings_and_numbers_are_read_back() {
        let form = form();
        assert_eq!(form.get_str("name").unwrap(), "Solyanka");
        assert_eq!(form.get_number::<i32>("cooking_time").unwrap(), 45);
        assert_eq!(form.get_number::<i64>("servings").unwrap(), 4);
    }

    #[test]
    fn missing_keys_are_errors() {
        assert!(form().get_str("missing").is_err());
        assert!(form().get_number::<i32>("missing").is_err());
    }

    #[test]
    fn arrays_only_convert_from_arrays() {
        assert_eq!(form().get_array("tags").unwrap().len(), 3);
        assert!(form().get_array("name").is_err());
    }
}
