mod generate;
mod manifest;
