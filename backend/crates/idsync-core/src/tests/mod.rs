mod name_normalizer;
