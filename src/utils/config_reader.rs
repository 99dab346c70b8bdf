use std::path::Path;

use crate::create_rotate_error_result;
use crate::model::MainConfig;
use crate::rotate_error::RotateError;
use crate::utils::{config_file_reader, open_file};

pub fn read_config(config_path: &str, config_file: &str) -> Result<MainConfig, RotateError> {
    match open_file(Path::new(config_file)) {
        Ok(file) => match serde_yaml::from_reader::<_, MainConfig>(config_file_reader(file, true)) {
            Ok(mut result) => {
                result.t_config_path = config_path.to_string();
                result.t_config_file_path = config_file.to_string();
                result.prepare()?;
                Ok(result)
            }
            Err(e) => create_rotate_error_result!("cant read config file: {}", e),
        },
        Err(err) => create_rotate_error_result!("{}", err),
    }
}
